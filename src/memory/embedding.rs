//! Text embedding.

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;
use tracing::info;

use super::MemoryError;

/// Turns texts into fixed-size vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, MemoryError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let mut vectors = self.embed_batch(vec![text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(MemoryError::EmbeddingCount {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }
}

/// Local ONNX embedder (BGE-Small-En-V1.5).
///
/// The model is loaded lazily on first use; the download is cached by
/// fastembed under its default cache directory.
pub struct FastEmbedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model", &"BGESmallENV15")
            .finish()
    }
}

impl Default for FastEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl FastEmbedder {
    /// Create an embedder; the model is not loaded yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: Arc::new(Mutex::new(None)),
        }
    }

    /// Load the model now instead of on the first request.
    pub async fn initialize(&self) -> Result<(), MemoryError> {
        let mut guard = self.model.lock().await;
        if guard.is_none() {
            *guard = Some(load_model().await?);
        }
        Ok(())
    }
}

async fn load_model() -> Result<TextEmbedding, MemoryError> {
    info!("Initializing fastembed model (BG-Small-En-V1.5)...");
    tokio::task::spawn_blocking(|| {
        let mut options = InitOptions::new(EmbeddingModel::BGESmallENV15);
        options.show_download_progress = false;
        TextEmbedding::try_new(options)
    })
    .await
    .map_err(|e| MemoryError::Embedding(e.to_string()))?
    .map_err(|e| MemoryError::Embedding(e.to_string()))
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, MemoryError> {
        let expected = texts.len();
        let mut guard = self.model.lock().await;
        let mut owned_model = match guard.take() {
            Some(model) => model,
            None => load_model().await?,
        };

        // The model moves into the blocking task and comes back with the result.
        let (result, returned_model) = tokio::task::spawn_blocking(move || {
            let res = owned_model.embed(texts, None);
            (res, owned_model)
        })
        .await
        .map_err(|e| MemoryError::Embedding(e.to_string()))?;

        *guard = Some(returned_model);
        let vectors = result.map_err(|e| MemoryError::Embedding(e.to_string()))?;

        if vectors.len() != expected {
            return Err(MemoryError::EmbeddingCount {
                expected,
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

/// Cosine similarity of two vectors; 0.0 when either is all zeros.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
