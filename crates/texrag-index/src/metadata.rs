use std::fs;
use std::io::Write;
use std::path::Path;

use texrag_core::types::ChunkRecord;
use texrag_core::{Error, Result};

/// Chunk records in row order; row `i` describes vector `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    records: Vec<ChunkRecord>,
}

impl MetadataStore {
    pub fn new(records: Vec<ChunkRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: ChunkRecord) {
        self.records.push(record);
    }

    pub fn get(&self, row: usize) -> Option<&ChunkRecord> {
        self.records.get(row)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ChunkRecord> {
        self.records
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.records)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Unparseable content is reported as [`Error::CorruptIndex`].
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)?;
        let records = serde_json::from_slice(&raw)
            .map_err(|e| Error::CorruptIndex(format!("{}: {}", path.display(), e)))?;
        Ok(Self { records })
    }
}
