//! OpenAI-compatible Chat Completions agent.
//!
//! This module implements [`CompletionAgent`] on top of `/v1/chat/completions`
//! with a single non-streaming request per reply.

use serde::Deserialize;

use super::{AgentError, CompletionAgent, LlmSettings, Message, Reply};

/// Agent for OpenAI-compatible Chat Completions endpoints.
///
/// Every request carries the configured system message first, followed by the
/// caller's messages unchanged.
#[derive(Clone)]
pub struct ChatCompletionsAgent {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsAgent")
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsAgent {
    /// Create a new agent with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Build the JSON request body for a conversation.
    fn request_body(&self, messages: Vec<Message>) -> serde_json::Value {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if !self.settings.system_message.is_empty() {
            wire.push(Message::system(self.settings.system_message.clone()));
        }
        wire.extend(messages);

        serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": wire,
        })
    }
}

#[async_trait::async_trait]
impl CompletionAgent for ChatCompletionsAgent {
    async fn generate_reply(&self, messages: Vec<Message>) -> Result<Reply, AgentError> {
        let url = self
            .settings
            .provider
            .build_chat_url(&self.settings.base_url);
        let body = self.request_body(messages);

        tracing::debug!(url = %url, model = %self.settings.model, "Sending completion request");

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Completion endpoint returned an error");
            return Err(AgentError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| AgentError::Malformed(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyChoices)?;
        let content = choice.message.content.unwrap_or_default();

        tracing::debug!(content_length = content.len(), "Completion received");

        Ok(Reply { content })
    }
}
