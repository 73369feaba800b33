use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Neighbor;

/// Turns raw document text into plain searchable text. Must be total.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> String;
}

/// Maps text to unit-length vectors of a fixed dimension.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model behind this embedder.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::EmbeddingFailure("embedder returned no vector".to_string()))
    }
}

/// Append-only store of vectors answering k-nearest-neighbor queries.
pub trait VectorIndex: Send + Sync {
    /// `None` until the first `add` fixes the dimension.
    fn dim(&self) -> Option<usize>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;
    /// At most `k` neighbors, ascending distance.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
    fn save(&self, path: &Path) -> Result<()>;
}

/// Opaque text generation collaborator.
pub trait Generator: Send + Sync {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
