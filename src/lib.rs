//! Hazel, an AI friend chatbot.
//!
//! Hazel remembers what each user tells it. Every turn searches a per-user
//! vector memory, folds the matches into a persona prompt, asks a hosted
//! completion model for the reply and writes the exchange back to memory.
//!
//! # Architecture
//!
//! - **Console**: line-oriented chat loop on stdin/stdout
//! - **Server**: Axum-based web GUI with a small JSON API
//! - **Memory**: local embeddings + embedded `SurrealDB` table
//! - **LLM**: OpenAI-compatible chat completions (Groq by default)
//!
//! # Modules
//!
//! - [`config`]: CLI and layered configuration
//! - [`llm`]: completion agent trait and implementation
//! - [`memory`]: memory store trait and vector implementation
//! - [`prompt`]: persona and prompt assembly
//! - [`chat`]: turn handling shared by both front ends
//! - [`console`]: console front end
//! - [`session`]: GUI session state
//! - [`server`]: HTTP routes and bootstrap
//! - [`ui`]: server-rendered HTML

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod chat;
pub mod config;
pub mod console;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod server;
pub mod session;
pub mod ui;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::chat::ChatService;
use crate::config::HazelConfig;
use crate::llm::ChatCompletionsAgent;
use crate::memory::{FastEmbedder, VectorMemory};

/// Wire the memory store and completion agent described by `config` into a
/// [`ChatService`].
pub async fn build_chat_service(config: &HazelConfig) -> anyhow::Result<ChatService> {
    let settings = config.llm_settings();
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = ?settings.provider,
        "LLM configuration loaded"
    );

    let embedder = FastEmbedder::new();
    embedder
        .initialize()
        .await
        .context("failed to load the embedding model")?;

    let memory = VectorMemory::open(
        &config.memory.path,
        Arc::new(embedder),
        config.memory_options(),
    )
    .await
    .with_context(|| format!("failed to open memory store at {}", config.memory.path))?;

    let agent = ChatCompletionsAgent::new(settings);

    Ok(ChatService::new(Arc::new(memory), Arc::new(agent))
        .with_assistant_name(config.llm.assistant_name.clone())
        .with_history_window(config.chat.history_window))
}
