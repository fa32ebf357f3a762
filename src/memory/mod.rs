//! Long-term memory.
//!
//! A [`MemoryStore`] keeps short text snippets partitioned by user identifier
//! and returns the ones most relevant to a query. The store is append-only:
//! nothing in this crate updates or deletes a record.
//!
//! - [`embedding`]: text → vector ([`FastEmbedder`] runs a local ONNX model)
//! - [`vector`]: [`VectorMemory`], an embedded `SurrealDB` table searched by cosine similarity

pub mod embedding;
pub mod vector;

pub use embedding::{Embedder, FastEmbedder};
pub use vector::{VectorMemory, VectorMemoryOptions};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored memory snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Snippet text.
    pub memory: String,
    /// Partition key.
    pub user_id: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
}

/// A search hit with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMatch {
    /// Matched record.
    pub record: MemoryRecord,
    /// Cosine similarity to the query, higher is closer.
    pub score: f32,
}

impl MemoryMatch {
    /// The snippet text.
    #[must_use]
    pub fn memory(&self) -> &str {
        &self.record.memory
    }
}

/// Errors returned by memory stores.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Storage engine failure.
    #[error("database error: {0}")]
    Database(#[from] surrealdb::Error),

    /// The embedding model failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The embedding model returned the wrong number of vectors.
    #[error("expected {expected} embeddings, got {actual}")]
    EmbeddingCount {
        /// Number of texts submitted.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },
}

/// Semantic memory scoped per user.
#[async_trait::async_trait]
pub trait MemoryStore: Send + Sync {
    /// Return memories for `user_id` relevant to `query`, best match first.
    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryMatch>, MemoryError>;

    /// Append a memory for `user_id`.
    async fn add(&self, text: &str, user_id: &str) -> Result<(), MemoryError>;
}
