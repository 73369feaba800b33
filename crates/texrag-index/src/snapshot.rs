//! Generation directories plus an atomically replaced `CURRENT` pointer.
//!
//! ```text
//! <index_dir>/CURRENT                      generation name
//! <index_dir>/snapshots/<gen>/vectors.bin
//! <index_dir>/snapshots/<gen>/metadata.json
//! ```
//!
//! A generation becomes visible only when `CURRENT` is renamed into place,
//! after both of its files are complete. Publishing keeps the new and the
//! previously active generation and prunes everything older.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use texrag_core::traits::VectorIndex;
use texrag_core::{Error, Result};

use crate::flat::FlatIndex;
use crate::metadata::MetadataStore;

pub const CURRENT_FILE: &str = "CURRENT";
pub const SNAPSHOTS_DIR: &str = "snapshots";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const METADATA_FILE: &str = "metadata.json";

/// A loaded, integrity-checked index/metadata pair.
#[derive(Debug)]
pub struct Snapshot {
    pub generation: String,
    pub dir: PathBuf,
    pub index: FlatIndex,
    pub metadata: MetadataStore,
}

impl Snapshot {
    /// Publishes `index` and `metadata` as a new generation under
    /// `index_dir` and returns its directory. The previously active
    /// generation stays active if anything fails before the pointer flip.
    pub fn write(
        index_dir: &Path,
        index: &FlatIndex,
        metadata: &MetadataStore,
    ) -> Result<PathBuf> {
        check_integrity(index, metadata)?;
        let snapshots = index_dir.join(SNAPSHOTS_DIR);
        fs::create_dir_all(&snapshots)?;

        let previous = current_generation(index_dir).ok().flatten();
        let (generation, dir) = create_generation_dir(&snapshots)?;
        index.save(&dir.join(VECTORS_FILE))?;
        metadata.save(&dir.join(METADATA_FILE))?;

        let mut tmp = tempfile::NamedTempFile::new_in(index_dir)?;
        writeln!(tmp, "{}", generation)?;
        tmp.as_file().sync_all()?;
        tmp.persist(index_dir.join(CURRENT_FILE)).map_err(|e| e.error)?;
        info!(generation = %generation, rows = index.len(), "published snapshot");

        // readers may still be loading the previous generation
        let keep: Vec<&str> = std::iter::once(generation.as_str())
            .chain(previous.as_deref())
            .collect();
        prune_generations(&snapshots, &keep);
        Ok(dir)
    }

    pub fn load(index_dir: &Path) -> Result<Self> {
        let generation = current_generation(index_dir)?.ok_or_else(|| {
            Error::NotFound(format!(
                "no snapshot under {}; run a build first",
                index_dir.display()
            ))
        })?;
        let dir = index_dir.join(SNAPSHOTS_DIR).join(&generation);
        let vectors_path = dir.join(VECTORS_FILE);
        let metadata_path = dir.join(METADATA_FILE);
        match (vectors_path.exists(), metadata_path.exists()) {
            (true, true) => {}
            (false, false) => {
                return Err(Error::NotFound(format!(
                    "snapshot {} is missing from {}",
                    generation,
                    dir.display()
                )))
            }
            (has_vectors, _) => {
                let missing = if has_vectors { METADATA_FILE } else { VECTORS_FILE };
                return Err(Error::IndexMetadataMismatch(format!(
                    "{} missing in {}",
                    missing,
                    dir.display()
                )));
            }
        }

        let index = FlatIndex::load(&vectors_path)?;
        let metadata = MetadataStore::load(&metadata_path)?;
        check_integrity(&index, &metadata)?;
        debug!(generation = %generation, rows = index.len(), "loaded snapshot");
        Ok(Self {
            generation,
            dir,
            index,
            metadata,
        })
    }
}

/// Name of the active generation, `None` when nothing was ever published.
pub fn current_generation(index_dir: &Path) -> Result<Option<String>> {
    let raw = match fs::read_to_string(index_dir.join(CURRENT_FILE)) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let name = raw.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::CorruptIndex(format!(
            "invalid {} pointer {:?}",
            CURRENT_FILE, name
        )));
    }
    Ok(Some(name.to_string()))
}

/// Row counts must agree and every record's `id` must equal its row.
pub fn check_integrity(index: &dyn VectorIndex, metadata: &MetadataStore) -> Result<()> {
    if index.len() != metadata.len() {
        return Err(Error::IndexMetadataMismatch(format!(
            "index has {} rows, metadata has {}",
            index.len(),
            metadata.len()
        )));
    }
    let misplaced = metadata.records().iter().enumerate().find(|(row, r)| r.id != *row);
    if let Some((row, record)) = misplaced {
        return Err(Error::IndexMetadataMismatch(format!(
            "row {} holds record id {}",
            row, record.id
        )));
    }
    Ok(())
}

fn create_generation_dir(snapshots: &Path) -> Result<(String, PathBuf)> {
    let mut stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    loop {
        let generation = format!("gen-{:016}", stamp);
        let dir = snapshots.join(&generation);
        match fs::create_dir(&dir) {
            Ok(()) => return Ok((generation, dir)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

fn prune_generations(snapshots: &Path, keep: &[&str]) {
    let entries = match fs::read_dir(snapshots) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "could not list snapshot generations");
            return;
        }
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        if keep.iter().any(|k| name == *k) || !entry.path().is_dir() {
            continue;
        }
        match fs::remove_dir_all(entry.path()) {
            Ok(()) => debug!(generation = ?entry.file_name(), "pruned snapshot generation"),
            Err(e) => warn!(
                generation = ?entry.file_name(),
                error = %e,
                "failed to prune snapshot generation"
            ),
        }
    }
}
