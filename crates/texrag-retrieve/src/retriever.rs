use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use texrag_core::traits::{Embedder, VectorIndex};
use texrag_core::types::ChunkRecord;
use texrag_core::{Error, Result};
use texrag_index::{check_integrity, l2_normalize, MetadataStore, Snapshot};

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    /// Squared L2 distance to the query; smaller is closer.
    pub distance: f32,
}

/// Read-only query path over one loaded snapshot. Share with `Arc` across
/// threads.
pub struct Retriever {
    index: Box<dyn VectorIndex>,
    metadata: MetadataStore,
    embedder: Arc<dyn Embedder>,
    generation: Option<String>,
}

impl Retriever {
    /// Loads the active snapshot under `index_dir`. Either everything loads
    /// and agrees, or this fails.
    pub fn open(index_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let snapshot = Snapshot::load(index_dir)?;
        let mut retriever =
            Self::from_parts(Box::new(snapshot.index), snapshot.metadata, embedder)?;
        retriever.generation = Some(snapshot.generation);
        Ok(retriever)
    }

    pub fn from_parts(
        index: Box<dyn VectorIndex>,
        metadata: MetadataStore,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        check_integrity(index.as_ref(), &metadata)?;
        if let Some(dim) = index.dim() {
            if dim != embedder.dim() {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: embedder.dim(),
                });
            }
        }
        Ok(Self {
            index,
            metadata,
            embedder,
            generation: None,
        })
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Snapshot generation this retriever was opened from.
    pub fn generation(&self) -> Option<&str> {
        self.generation.as_deref()
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ChunkRecord>> {
        Ok(self.retrieve_scored(query, k)?.into_iter().map(|s| s.record).collect())
    }

    /// Up to `k` chunks nearest to `query`, closest first.
    pub fn retrieve_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let mut vector = self.embedder.embed_one(query)?;
        l2_normalize(&mut vector);
        let neighbors = self.index.search(&vector, k)?;

        let mut out = Vec::with_capacity(neighbors.len());
        for n in neighbors {
            let Some(row) = n.row_index() else {
                continue;
            };
            let record = self.metadata.get(row).ok_or_else(|| {
                Error::IndexMetadataMismatch(format!(
                    "index returned row {} but metadata has {}",
                    row,
                    self.metadata.len()
                ))
            })?;
            out.push(ScoredChunk {
                record: record.clone(),
                distance: n.distance,
            });
        }
        debug!(k, hits = out.len(), "retrieved chunks");
        Ok(out)
    }
}
