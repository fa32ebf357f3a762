//! Turn handling shared by the console and the GUI.
//!
//! A turn is always: memory search (inside the prompt builder), one
//! completion request, then memory writes. The two front ends differ in what
//! they feed the prompt and what they persist.

use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{CompletionAgent, Message};
use crate::memory::MemoryStore;
use crate::prompt::{DEFAULT_ASSISTANT_NAME, PromptBuilder};
use crate::session::{ChatTurn, Session};

/// GUI turn failures, classified for the HTTP layer.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No session with this ID.
    #[error("session not found: {0}")]
    SessionNotFound(String),
    /// The session is still on the start screen.
    #[error("chat has not been started for this session")]
    NotStarted,
    /// Memory or completion failure; the turn was rolled back.
    #[error("turn failed: {0:#}")]
    Turn(#[from] anyhow::Error),
}

/// Result of a GUI turn: the updated panel and the new input box value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// Chat panel contents after the turn.
    pub history: Vec<ChatTurn>,
    /// Value for the message box (always cleared).
    pub input: String,
}

/// Runs chat turns against a memory store and a completion agent.
#[derive(Clone)]
pub struct ChatService {
    memory: Arc<dyn MemoryStore>,
    agent: Arc<dyn CompletionAgent>,
    prompts: PromptBuilder,
    assistant_name: String,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("prompts", &self.prompts)
            .field("assistant_name", &self.assistant_name)
            .finish_non_exhaustive()
    }
}

impl ChatService {
    /// Create a service with the default assistant name and prompt settings.
    #[must_use]
    pub fn new(memory: Arc<dyn MemoryStore>, agent: Arc<dyn CompletionAgent>) -> Self {
        Self {
            prompts: PromptBuilder::new(Arc::clone(&memory)),
            memory,
            agent,
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
        }
    }

    /// Rename the assistant (persona, chat panel and memory labels).
    #[must_use]
    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self.prompts = self.prompts.with_assistant_name(&self.assistant_name);
        self
    }

    /// Change how many history turns GUI prompts include.
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.prompts = self.prompts.with_history_window(window);
        self
    }

    /// The assistant's display name.
    #[must_use]
    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    /// Send a prompt as the single user message and return the reply text.
    async fn ask(&self, prompt: String) -> anyhow::Result<String> {
        let reply = self
            .agent
            .generate_reply(vec![Message::user(prompt)])
            .await
            .context("completion request failed")?;
        Ok(reply.content)
    }

    /// One console turn: prompt without history, reply, then two memory records.
    ///
    /// Both records carry the user's input; the second one is labelled with
    /// the assistant name.
    pub async fn console_turn(&self, user_input: &str, user_id: &str) -> anyhow::Result<String> {
        let prompt = self.prompts.build(user_input, user_id, None).await?;
        let reply = self.ask(prompt).await?;

        self.memory
            .add(&format!("{user_id}: {user_input}"), user_id)
            .await
            .context("memory add failed")?;
        self.memory
            .add(&format!("{}: {user_input}", self.assistant_name), user_id)
            .await
            .context("memory add failed")?;

        debug!(user_id = %user_id, reply_length = reply.len(), "Console turn complete");
        Ok(reply)
    }

    /// Bind `name` to the session. Returns `false` (and changes nothing) for an
    /// empty name.
    pub async fn start_chat(&self, session: &Session, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let mut state = session.lock().await;
        state.user_id = Some(name.to_string());
        info!(session_id = %session.id(), user_id = %name, "Chat started");
        true
    }

    /// One GUI turn on an explicit history.
    ///
    /// Empty input returns immediately without touching any collaborator.
    /// Otherwise the user turn and the reply are appended, in that order, and
    /// only the user's utterance is written to memory. On failure the history
    /// is left as it was.
    pub async fn chatbot_response(
        &self,
        user_input: &str,
        chat_history: &mut Vec<ChatTurn>,
        user_id: &str,
    ) -> anyhow::Result<String> {
        if user_input.is_empty() {
            return Ok(String::new());
        }

        chat_history.push(ChatTurn::new(user_id, user_input));
        match self.gui_turn(user_input, chat_history, user_id).await {
            Ok(reply) => {
                chat_history.push(ChatTurn::new(self.assistant_name.clone(), reply));
                Ok(String::new())
            }
            Err(e) => {
                chat_history.pop();
                Err(e)
            }
        }
    }

    async fn gui_turn(
        &self,
        user_input: &str,
        chat_history: &[ChatTurn],
        user_id: &str,
    ) -> anyhow::Result<String> {
        let prompt = self
            .prompts
            .build(user_input, user_id, Some(chat_history))
            .await?;
        let reply = self.ask(prompt).await?;
        self.memory
            .add(&format!("{user_id}: {user_input}"), user_id)
            .await
            .context("memory add failed")?;
        Ok(reply)
    }

    /// Run a GUI turn for a stored session, holding its lock throughout.
    pub async fn respond(&self, session: &Session, user_input: &str) -> Result<ChatOutcome, ChatError> {
        let mut state = session.lock().await;
        let user_id = state.user_id.clone().ok_or(ChatError::NotStarted)?;

        let input = self
            .chatbot_response(user_input, &mut state.history, &user_id)
            .await?;

        Ok(ChatOutcome {
            history: state.history.clone(),
            input,
        })
    }
}
