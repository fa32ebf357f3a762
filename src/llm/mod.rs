//! Completion agent abstractions.
//!
//! This module wraps a hosted chat completion endpoint behind the
//! [`CompletionAgent`] trait. Callers hand it a list of [`Message`]s and get a
//! [`Reply`] back; the agent owns its persona system message and the wire
//! protocol.
//!
//! # Agents
//!
//! - [`ChatCompletionsAgent`]: OpenAI-compatible `/v1/chat/completions` (Groq by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use hazel::llm::{ChatCompletionsAgent, CompletionAgent, LlmSettings, Message, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.groq.com/openai".to_string(),
//!     api_key: std::env::var("GROQ_API_KEY").ok(),
//!     model: "llama-3.1-8b-instant".to_string(),
//!     provider: Provider::Groq,
//!     system_message: "You are a an AI friend chatbot".to_string(),
//! };
//! let agent = ChatCompletionsAgent::new(settings);
//! let reply = agent.generate_reply(vec![Message::user("hello")]).await?;
//! println!("{}", reply.content);
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsAgent;
pub use provider::Provider;

use thiserror::Error;

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.groq.com/openai`).
    pub base_url: String,
    /// Optional API key, sent as a bearer token when present.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `llama-3.1-8b-instant`).
    pub model: String,
    /// Provider type (auto-detected from `base_url` by the config loader).
    pub provider: Provider,
    /// System message the agent prepends to every request.
    pub system_message: String,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("system_message", &self.system_message)
            .finish()
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// A message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// The agent's answer to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply text.
    pub content: String,
}

/// Errors returned by completion agents.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed completion response: {0}")]
    Malformed(String),

    /// The response carried no choices.
    #[error("completion response contained no choices")]
    EmptyChoices,
}

/// A conversational agent backed by a remote completion API.
#[async_trait::async_trait]
pub trait CompletionAgent: Send + Sync {
    /// Generate a reply for the given conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be read.
    async fn generate_reply(&self, messages: Vec<Message>) -> Result<Reply, AgentError>;
}
