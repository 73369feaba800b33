//! Embedding backends behind the [`texrag_core::traits::Embedder`] trait.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use texrag_core::config::EmbeddingBackend;
use texrag_core::config::EmbeddingSettings;
use texrag_core::traits::Embedder;

pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use hash::HashEmbedder;
pub use model::MiniLmEmbedder;
pub use pool::masked_mean_l2;

/// Picks the backend from settings. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hash embedder regardless of configuration.
pub fn get_default_embedder(
    settings: &EmbeddingSettings,
    model_dir: Option<&Path>,
) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake || settings.backend == EmbeddingBackend::Hash {
        info!(dim = settings.hash_dim, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(settings.hash_dim)?));
    }
    let dir = resolve_model_dir(&settings.model_name, model_dir)?;
    Ok(Box::new(MiniLmEmbedder::load(&dir, &settings.model_name, settings.max_len)?))
}

/// Explicit directory, then `APP_MODEL_DIR`, `MODEL_DIR`, then
/// `models/<short name>` relative to the parent or current directory.
pub fn resolve_model_dir(model_name: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() {
            info!(dir = %p.display(), "using configured model dir");
            return Ok(p.to_path_buf());
        }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                info!(dir = %p.display(), var, "using model dir from env");
                return Ok(p);
            }
        }
    }
    let short = model_name.rsplit('/').next().unwrap_or(model_name);
    for root in ["../models", "models"] {
        let p = Path::new(root).join(short);
        if p.exists() {
            info!(dir = %p.display(), "using model dir");
            return Ok(p);
        }
    }
    Err(anyhow!("Could not locate model directory for {}", model_name))
}
