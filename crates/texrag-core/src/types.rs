//! Domain types shared by the indexing and retrieval crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Dense, 0-based row position shared by the vector index and metadata store.
pub type ChunkId = usize;

/// Row value a backend may use to pad a result list it could not fill.
pub const NO_NEIGHBOR: i64 = -1;

/// Closed set of document kinds produced by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    CheatSheet,
    Pset,
    Manual,
    Resume,
    Research,
    CourseNotes,
    CourseStatistics,
    #[default]
    Unknown,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::CheatSheet => "cheat_sheet",
            DocType::Pset => "pset",
            DocType::Manual => "manual",
            DocType::Resume => "resume",
            DocType::Research => "research",
            DocType::CourseNotes => "course_notes",
            DocType::CourseStatistics => "course_statistics",
            DocType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source document after normalization and classification.
///
/// - `doc_id`: position of the file in the sorted ingestion order
/// - `doc_path`: path relative to the corpus root
/// - `doc_name`: file name only
#[derive(Debug, Clone)]
pub struct Document {
    pub doc_id: usize,
    pub doc_path: String,
    pub doc_name: String,
    pub doc_type: DocType,
    pub tags: BTreeSet<String>,
    pub plain_text: String,
}

/// One row of the metadata store.
///
/// `id` is the row position in both the vector index and the metadata array.
/// `start`/`end` are character offsets into the document's normalized text
/// (end exclusive) of the untrimmed window; `text` is the trimmed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: ChunkId,
    pub doc_id: usize,
    pub doc_path: String,
    pub doc_name: String,
    pub doc_type: DocType,
    pub tags: Vec<String>,
    pub chunk_index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A single search result from a vector index, ordered by ascending distance.
///
/// `row` is signed so that backends which pad short result lists can report
/// [`NO_NEIGHBOR`]; callers skip such entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: i64,
    pub distance: f32,
}

impl Neighbor {
    pub fn row_index(&self) -> Option<usize> {
        usize::try_from(self.row).ok()
    }
}
