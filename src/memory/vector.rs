//! Embedded vector memory on `SurrealDB`.
//!
//! Records live in one table (the "collection"). A search loads the user's
//! partition, scores every record against the query embedding and keeps the
//! best `limit` above `min_score`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use tracing::{debug, info};
use uuid::Uuid;

use super::embedding::cosine_similarity;
use super::{Embedder, MemoryError, MemoryMatch, MemoryRecord, MemoryStore};

/// Row layout of the memory table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMemory {
    memory: String,
    user_id: String,
    created_at: String,
    embedding: Vec<f32>,
}

impl StoredMemory {
    fn into_parts(self) -> (MemoryRecord, Vec<f32>) {
        let record = MemoryRecord {
            memory: self.memory,
            user_id: self.user_id,
            created_at: self.created_at,
        };
        (record, self.embedding)
    }
}

/// Search tuning for [`VectorMemory`].
#[derive(Debug, Clone)]
pub struct VectorMemoryOptions {
    /// Table holding the records.
    pub collection: String,
    /// Maximum number of matches returned by a search.
    pub search_limit: usize,
    /// Matches scoring below this are dropped.
    pub min_score: f32,
}

impl Default for VectorMemoryOptions {
    fn default() -> Self {
        Self {
            collection: "ai_friend_chatbot_memory".to_string(),
            search_limit: 100,
            min_score: 0.0,
        }
    }
}

/// [`MemoryStore`] backed by an embedded `SurrealDB` database.
pub struct VectorMemory {
    db: Surreal<Any>,
    embedder: Arc<dyn Embedder>,
    options: VectorMemoryOptions,
}

impl std::fmt::Debug for VectorMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorMemory")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl VectorMemory {
    /// Open (or create) the database at `endpoint`.
    ///
    /// `endpoint` is any `SurrealDB` connection string, e.g.
    /// `surrealkv://hazel_db` for the on-disk store or `mem://` for tests.
    pub async fn open(
        endpoint: &str,
        embedder: Arc<dyn Embedder>,
        options: VectorMemoryOptions,
    ) -> Result<Self, MemoryError> {
        let db = connect(endpoint).await?;
        db.use_ns("hazel").use_db("hazel").await?;

        info!(
            endpoint = %endpoint,
            collection = %options.collection,
            "Vector memory opened"
        );

        Ok(Self {
            db,
            embedder,
            options,
        })
    }

    /// All rows for one user, oldest first.
    async fn load_partition(&self, user_id: &str) -> Result<Vec<StoredMemory>, MemoryError> {
        let sql = "SELECT memory, user_id, created_at, embedding FROM type::table($table) WHERE user_id = $user_id ORDER BY created_at";
        let mut res = self
            .db
            .query(sql)
            .bind(("table", self.options.collection.clone()))
            .bind(("user_id", user_id.to_string()))
            .await?;
        let rows: Vec<StoredMemory> = res.take(0)?;
        Ok(rows)
    }
}

#[async_trait]
impl MemoryStore for VectorMemory {
    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryMatch>, MemoryError> {
        let rows = self.load_partition(user_id).await?;
        if rows.is_empty() {
            debug!(user_id = %user_id, "No memories for user");
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query).await?;

        let mut matches: Vec<MemoryMatch> = rows
            .into_iter()
            .map(|row| {
                let (record, embedding) = row.into_parts();
                MemoryMatch {
                    score: cosine_similarity(&embedding, &query_vec),
                    record,
                }
            })
            .filter(|m| m.score >= self.options.min_score)
            .collect();

        // Stable sort keeps chronological order among equal scores.
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(self.options.search_limit);

        debug!(user_id = %user_id, returned = matches.len(), "Memory search");
        Ok(matches)
    }

    async fn add(&self, text: &str, user_id: &str) -> Result<(), MemoryError> {
        let embedding = self.embedder.embed(text).await?;
        let row = StoredMemory {
            memory: text.to_string(),
            user_id: user_id.to_string(),
            // Fixed width so the string order is the time order.
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
            embedding,
        };

        let id = Uuid::new_v4().to_string();
        self.db
            .query("CREATE type::thing($table, $id) CONTENT $row")
            .bind(("table", self.options.collection.clone()))
            .bind(("id", id))
            .bind(("row", row))
            .await?
            .check()?;

        debug!(user_id = %user_id, content_len = text.len(), "Stored memory");
        Ok(())
    }
}
