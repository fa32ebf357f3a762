//! HTTP front end: the HTML GUI, its JSON API and the server bootstrap.

use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use axum_extra::{TypedHeader, headers::Cookie};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::chat::{ChatError, ChatService};
use crate::config::HazelConfig;
use crate::session::{ChatTurn, Session, SessionStore};
use crate::ui;

/// Cookie carrying the browser session ID.
pub const SESSION_COOKIE: &str = "hazel_session";

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Turn handling.
    pub chat: ChatService,
    /// Browser sessions.
    pub sessions: SessionStore,
}

impl AppState {
    #[must_use]
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat,
            sessions: SessionStore::new(),
        }
    }
}

/// Build the router for the GUI and its API.
pub fn router(state: AppState) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(index_handler))
        .route("/start", post(start_form_handler))
        .route("/chat", post(chat_form_handler))
        // API routes
        .route("/api/start", post(api_start))
        .route("/api/chat", post(api_chat))
        .route("/api/sessions/{id}", delete(api_delete_session))
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server and serve until Ctrl-C.
pub async fn start_server(config: &HazelConfig, chat: ChatService) -> anyhow::Result<()> {
    let state = AppState::new(chat);

    let sessions = state.sessions.clone();
    let timeout = config.session_timeout();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_expired_with_timeout(timeout);
            if removed > 0 {
                info!(removed, remaining = sessions.len(), "Expired sessions removed");
            }
        }
    });

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %format!("http://{addr}"),
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body of `POST /start`.
#[derive(Debug, Deserialize)]
struct StartForm {
    #[serde(default)]
    name: String,
}

/// Form body of `POST /chat`.
#[derive(Debug, Deserialize)]
struct MessageForm {
    #[serde(default)]
    message: String,
}

fn session_from_cookie(state: &AppState, cookie: Option<&TypedHeader<Cookie>>) -> Option<Session> {
    let id = cookie?.0.get(SESSION_COOKIE)?;
    state.sessions.get(id)
}

fn session_cookie(session: &Session) -> String {
    format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        session.id()
    )
}

fn start_page(state: &AppState) -> Html<String> {
    let name = state.chat.assistant_name();
    Html(ui::html_shell(name, &ui::start_screen(name)))
}

fn chat_page(state: &AppState, user_id: &str, history: &[ChatTurn], error: Option<&str>) -> Html<String> {
    let name = state.chat.assistant_name();
    Html(ui::html_shell(
        name,
        &ui::chat_screen(name, user_id, history, error),
    ))
}

/// GET / - start screen, or the chat panel once the session has a user.
async fn index_handler(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Html<String> {
    let Some(session) = session_from_cookie(&state, cookie.as_ref()) else {
        return start_page(&state);
    };

    let guard = session.lock().await;
    match &guard.user_id {
        Some(user_id) => chat_page(&state, user_id, &guard.history, None),
        None => start_page(&state),
    }
}

/// POST /start - bind the name and show the chat panel.
async fn start_form_handler(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
    Form(form): Form<StartForm>,
) -> Response {
    let session = session_from_cookie(&state, cookie.as_ref())
        .unwrap_or_else(|| state.sessions.create());

    if !state.chat.start_chat(&session, &form.name).await {
        debug!(session_id = %session.id(), "Empty name, staying on start screen");
    }

    (
        [(header::SET_COOKIE, session_cookie(&session))],
        Redirect::to("/"),
    )
        .into_response()
}

/// POST /chat - run a turn and re-render the chat panel.
async fn chat_form_handler(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
    Form(form): Form<MessageForm>,
) -> Response {
    let Some(session) = session_from_cookie(&state, cookie.as_ref()) else {
        return Redirect::to("/").into_response();
    };

    match state.chat.respond(&session, &form.message).await {
        Ok(outcome) => {
            let user_id = session.user_id().await.unwrap_or_default();
            chat_page(&state, &user_id, &outcome.history, None).into_response()
        }
        Err(ChatError::NotStarted | ChatError::SessionNotFound(_)) => {
            Redirect::to("/").into_response()
        }
        Err(e) => {
            let guard = session.lock().await;
            let user_id = guard.user_id.clone().unwrap_or_default();
            let page = chat_page(&state, &user_id, &guard.history, Some(&e.to_string()));
            (StatusCode::BAD_GATEWAY, page).into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Error body for API responses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotStarted => StatusCode::CONFLICT,
            Self::Turn(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            warn!(error = %self, "Chat turn failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Request body for the start API.
#[derive(Debug, Deserialize)]
struct StartRequest {
    /// Name to bind as the user identifier.
    name: String,
    /// Existing session to start (creates new if not provided).
    #[serde(default)]
    session_id: Option<String>,
}

/// Response from the start API.
#[derive(Debug, Serialize)]
struct StartResponse {
    session_id: String,
    /// `false` when the name was empty and nothing changed.
    started: bool,
    user_id: Option<String>,
}

/// POST /api/start - create (or reuse) a session and bind the name.
async fn api_start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, ChatError> {
    let session = match req.session_id.as_deref() {
        Some(id) if !id.is_empty() => state
            .sessions
            .get(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?,
        _ => state.sessions.create(),
    };

    let started = state.chat.start_chat(&session, &req.name).await;
    Ok(Json(StartResponse {
        session_id: session.id().to_string(),
        started,
        user_id: session.user_id().await,
    }))
}

/// Request body for chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: String,
    /// User message content.
    #[serde(default)]
    message: String,
}

/// Response from chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    /// Chat panel contents after the turn.
    history: Vec<ChatTurn>,
    /// New message box value.
    input: String,
}

/// POST /api/chat - run one turn.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    let session = state
        .sessions
        .get(&req.session_id)
        .ok_or_else(|| ChatError::SessionNotFound(req.session_id.clone()))?;

    let outcome = state.chat.respond(&session, &req.message).await?;
    Ok(Json(ChatResponse {
        session_id: req.session_id,
        history: outcome.history,
        input: outcome.input,
    }))
}

/// GET /api/sessions/:id/messages - Get the chat panel contents.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatTurn>>, StatusCode> {
    match state.sessions.get(&id) {
        Some(session) => Ok(Json(session.history().await)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// DELETE /api/sessions/:id - Delete a session.
async fn api_delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.sessions.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// Response from the health check.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
    })
}
