use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

use texrag_core::config::{expand_path, Settings};
use texrag_core::data_processor::DataProcessor;
use texrag_core::traits::{Embedder, VectorIndex};
use texrag_core::types::ChunkRecord;
use texrag_core::{Error, Result};
use texrag_index::{l2_normalize, FlatIndex, MetadataStore, Snapshot};

pub const DEFAULT_BATCH_SIZE: usize = 32;

const PROGRESS_TEMPLATE: &str = concat!(
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] ",
    "{pos}/{len} chunks ({percent}%) {msg}"
);

/// Summary of a published build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Documents that contributed at least one chunk.
    pub documents: usize,
    pub chunks: usize,
    pub dim: usize,
    pub model_id: String,
    pub snapshot_dir: PathBuf,
}

pub struct IndexBuilder {
    processor: DataProcessor,
    batch_size: usize,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(processor: DataProcessor) -> Self {
        Self {
            processor,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: true,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(DataProcessor::from_settings(settings)?)
            .with_batch_size(settings.embedding.batch_size)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("embedding batch size must be positive".to_string()));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Ingests `docs_dir` and embeds every chunk. Nothing touches disk.
    pub fn build(
        &self,
        docs_dir: &Path,
        embedder: &dyn Embedder,
    ) -> Result<(FlatIndex, MetadataStore)> {
        let chunks = self.processor.process_directory(docs_dir)?;
        let index = self.embed_chunks(&chunks, embedder)?;
        Ok((index, MetadataStore::new(chunks)))
    }

    /// Builds and publishes a new snapshot generation under `index_dir`.
    /// On any error the previously active snapshot is left in place.
    pub fn build_and_publish(
        &self,
        docs_dir: &Path,
        index_dir: &Path,
        embedder: &dyn Embedder,
    ) -> Result<BuildReport> {
        info!(
            docs = %docs_dir.display(),
            index = %index_dir.display(),
            model = embedder.model_id(),
            "starting index build"
        );
        let (index, metadata) = self.build(docs_dir, embedder)?;
        std::fs::create_dir_all(index_dir)?;
        let snapshot_dir = Snapshot::write(index_dir, &index, &metadata)?;
        let documents = metadata
            .records()
            .iter()
            .map(|r| r.doc_id)
            .collect::<BTreeSet<_>>()
            .len();
        let report = BuildReport {
            documents,
            chunks: metadata.len(),
            dim: index.dim().unwrap_or(0),
            model_id: embedder.model_id().to_string(),
            snapshot_dir,
        };
        info!(
            documents = report.documents,
            chunks = report.chunks,
            dim = report.dim,
            "index build complete"
        );
        Ok(report)
    }

    fn embed_chunks(&self, chunks: &[ChunkRecord], embedder: &dyn Embedder) -> Result<FlatIndex> {
        let dim = embedder.dim();
        let mut index = FlatIndex::with_dim(dim)?;
        let pb = if self.show_progress {
            ProgressBar::new(chunks.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
            pb.set_style(style.progress_chars("#>-"));
        }

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let mut vectors = embedder.embed_batch(&texts)?;
            if vectors.len() != texts.len() {
                return Err(Error::EmbeddingFailure(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                )));
            }
            for v in &mut vectors {
                if v.len() != dim {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        actual: v.len(),
                    });
                }
                l2_normalize(v);
            }
            index.add(&vectors)?;
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("embedded");
        Ok(index)
    }
}

/// Full rebuild from settings. Relative `data.*` paths are taken relative to
/// the working directory; use [`IndexBuilder::build_and_publish`] to resolve
/// them elsewhere.
pub fn rebuild(settings: &Settings, embedder: &dyn Embedder) -> Result<BuildReport> {
    let docs_dir = expand_path(&settings.data.docs_dir);
    let index_dir = expand_path(&settings.data.index_dir);
    IndexBuilder::from_settings(settings)?.build_and_publish(&docs_dir, &index_dir, embedder)
}
