mod common;

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum_test::TestServer;
use common::{CallLog, Harness, RecordingMemory, ScriptedAgent};
use hazel::server::{AppState, SESSION_COOKIE, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_server(h: &Harness) -> TestServer {
    TestServer::new(router(AppState::new(h.chat.clone()))).unwrap()
}

async fn start(server: &TestServer, name: &str) -> Value {
    server
        .post("/api/start")
        .json(&json!({ "name": name }))
        .await
        .json::<Value>()
}

#[tokio::test]
async fn test_index_shows_start_screen() {
    let h = Harness::replying("ok");
    let server = test_server(&h);

    let response = server.get("/").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Enter your name to start to chat"));
    assert!(html.contains(r#"action="/start""#));
}

#[tokio::test]
async fn test_health() {
    let h = Harness::replying("ok");
    let app = router(AppState::new(h.chat.clone()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_start_and_chat() {
    let h = Harness::replying("Nice to meet you, Alex!");
    let server = test_server(&h);

    let started = start(&server, "Alex").await;
    assert_eq!(started["started"], true);
    assert_eq!(started["user_id"], "Alex");
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let response = server
        .post("/api/chat")
        .json(&json!({ "session_id": session_id, "message": "hello" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["input"], "");
    assert_eq!(
        body["history"],
        json!([
            { "speaker": "Alex", "text": "hello" },
            { "speaker": "Hazel", "text": "Nice to meet you, Alex!" },
        ])
    );

    let messages = server
        .get(&format!("/api/sessions/{session_id}/messages"))
        .await
        .json::<Value>();
    assert_eq!(messages, body["history"]);
}

#[tokio::test]
async fn test_api_empty_name_does_not_start() {
    let h = Harness::replying("ok");
    let server = test_server(&h);

    let started = start(&server, "").await;
    assert_eq!(started["started"], false);
    assert_eq!(started["user_id"], Value::Null);

    let response = server
        .post("/api/chat")
        .json(&json!({ "session_id": started["session_id"], "message": "hello" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert!(h.log.events().is_empty());
}

#[tokio::test]
async fn test_api_empty_message_is_a_no_op() {
    let h = Harness::replying("ok");
    let server = test_server(&h);
    let started = start(&server, "Alex").await;

    let response = server
        .post("/api/chat")
        .json(&json!({ "session_id": started["session_id"], "message": "" }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["history"], json!([]));
    assert!(h.log.events().is_empty());
}

#[tokio::test]
async fn test_api_unknown_session() {
    let h = Harness::replying("ok");
    let server = test_server(&h);

    server
        .post("/api/chat")
        .json(&json!({ "session_id": "missing", "message": "hello" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/api/sessions/missing/messages")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/api/start")
        .json(&json!({ "name": "Alex", "session_id": "missing" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_failed_turn_is_bad_gateway() {
    let log = CallLog::default();
    let h = Harness::new(
        RecordingMemory::new(log.clone()),
        ScriptedAgent::failing(log.clone()),
        log,
    );
    let server = test_server(&h);
    let started = start(&server, "Alex").await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let response = server
        .post("/api/chat")
        .json(&json!({ "session_id": session_id, "message": "hello" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(
        response.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .contains("model overloaded")
    );
    // The pending user turn was rolled back.
    let messages = server
        .get(&format!("/api/sessions/{session_id}/messages"))
        .await
        .json::<Value>();
    assert_eq!(messages, json!([]));
}

#[tokio::test]
async fn test_delete_session() {
    let h = Harness::replying("ok");
    let server = test_server(&h);
    let started = start(&server, "Alex").await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/sessions/{session_id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&format!("/api/sessions/{session_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_html_forms_with_session_cookie() {
    let h = Harness::replying("Hello <friend>");
    let server = test_server(&h);

    let response = server
        .post("/start")
        .form(&json!({ "name": "Alex" }))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));

    let page = server
        .get("/")
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
        .await
        .text();
    assert!(page.contains(r#"action="/chat""#));

    let page = server
        .post("/chat")
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
        .form(&json!({ "message": "hi there" }))
        .await
        .text();
    assert!(page.contains("hi there"));
    assert!(page.contains("Hello &lt;friend&gt;"));
}

#[tokio::test]
async fn test_chat_form_without_session_redirects() {
    let h = Harness::replying("ok");
    let server = test_server(&h);

    server
        .post("/chat")
        .form(&json!({ "message": "hello" }))
        .await
        .assert_status(StatusCode::SEE_OTHER);
    assert!(h.log.events().is_empty());
}
