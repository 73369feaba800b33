use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chunker::{chunk_text, ChunkingConfig};
use crate::classify::Classifier;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::normalize::{LatexNormalizer, PlainTextNormalizer};
use crate::traits::Normalizer;
use crate::types::{ChunkRecord, Document};

/// Turns a directory of source files into classified documents and
/// globally numbered chunk records.
///
/// Each file is normalized by the normalizer registered for its extension
/// (`tex` gets [`LatexNormalizer`]); any other extension is read as plain
/// text.
pub struct DataProcessor {
    normalizers: BTreeMap<String, Arc<dyn Normalizer>>,
    fallback: Arc<dyn Normalizer>,
    classifier: Classifier,
    chunking: ChunkingConfig,
    extensions: Vec<String>,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self {
            normalizers: default_normalizers(),
            fallback: Arc::new(PlainTextNormalizer),
            classifier: Classifier::default(),
            chunking: ChunkingConfig::default(),
            extensions: vec!["tex".to_string()],
        }
    }
}

fn default_normalizers() -> BTreeMap<String, Arc<dyn Normalizer>> {
    let mut normalizers: BTreeMap<String, Arc<dyn Normalizer>> = BTreeMap::new();
    normalizers.insert("tex".to_string(), Arc::new(LatexNormalizer::new()));
    normalizers
}

impl DataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.chunking.validate()?;
        Ok(Self {
            normalizers: default_normalizers(),
            fallback: Arc::new(PlainTextNormalizer),
            classifier: Classifier::new(settings.classifier.clone()),
            chunking: settings.chunking,
            extensions: settings.data.extensions.clone(),
        })
    }

    /// Uses `normalizer` for every file regardless of extension.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizers.clear();
        self.fallback = normalizer;
        self
    }

    /// Registers `normalizer` for files ending in `extension` (case-insensitive).
    pub fn with_normalizer_for(
        mut self,
        extension: impl Into<String>,
        normalizer: Arc<dyn Normalizer>,
    ) -> Self {
        self.normalizers.insert(extension.into().to_ascii_lowercase(), normalizer);
        self
    }

    fn normalizer_for(&self, path: &Path) -> &Arc<dyn Normalizer> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.normalizers.get(&ext.to_ascii_lowercase()))
            .unwrap_or(&self.fallback)
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Result<Self> {
        chunking.validate()?;
        self.chunking = chunking;
        Ok(self)
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// All chunks of every source file under `data_dir`, ids assigned in
    /// document-then-chunk order. Fails with `EmptyCorpus` when there is
    /// nothing to index.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<ChunkRecord>> {
        let files = self.list_source_files(data_dir);
        self.process_files(data_dir, &files)
    }

    pub fn process_directory_limited(
        &self,
        data_dir: &Path,
        limit: usize,
    ) -> Result<Vec<ChunkRecord>> {
        let mut files = self.list_source_files(data_dir);
        if files.len() > limit {
            files.truncate(limit);
            info!(limit, "limited ingestion to the first files");
        }
        self.process_files(data_dir, &files)
    }

    fn process_files(&self, data_dir: &Path, files: &[PathBuf]) -> Result<Vec<ChunkRecord>> {
        if files.is_empty() {
            return Err(Error::EmptyCorpus(format!(
                "no {} files found under {}",
                self.extensions.join("/"),
                data_dir.display()
            )));
        }
        let documents = self.load_documents(data_dir, files)?;
        let chunks = self.chunk_documents(&documents);
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus(format!(
                "{} documents under {} produced no chunks",
                documents.len(),
                data_dir.display()
            )));
        }
        info!(files = documents.len(), chunks = chunks.len(), "processed corpus");
        Ok(chunks)
    }

    /// Reads, normalizes and classifies each file. Documents are independent,
    /// so this runs in parallel; `doc_id` follows the order of `files`.
    pub fn load_documents(&self, data_dir: &Path, files: &[PathBuf]) -> Result<Vec<Document>> {
        files
            .par_iter()
            .enumerate()
            .map(|(doc_id, path)| self.load_document(data_dir, doc_id, path))
            .collect()
    }

    fn load_document(&self, data_dir: &Path, doc_id: usize, path: &Path) -> Result<Document> {
        let raw = read_file_content(path)?;
        let plain_text = self.normalizer_for(path).normalize(&raw);
        let doc_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let doc_path = path
            .strip_prefix(data_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let doc_type = self.classifier.classify(&doc_name, &plain_text);
        let tags = self.classifier.infer_tags(&doc_name, doc_type);
        debug!(
            doc_id,
            doc = %doc_path,
            %doc_type,
            ?tags,
            chars = plain_text.chars().count(),
            "parsed document"
        );
        Ok(Document {
            doc_id,
            doc_path,
            doc_name,
            doc_type,
            tags,
            plain_text,
        })
    }

    /// Chunks every document in parallel, then assigns `id` as the running
    /// count of chunks in document-then-chunk order.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<ChunkRecord> {
        let per_document: Vec<Vec<ChunkRecord>> = documents
            .par_iter()
            .map(|doc| self.chunk_document(doc))
            .collect();
        let mut records: Vec<ChunkRecord> = per_document.into_iter().flatten().collect();
        for (id, record) in records.iter_mut().enumerate() {
            record.id = id;
        }
        records
    }

    fn chunk_document(&self, doc: &Document) -> Vec<ChunkRecord> {
        let tags: Vec<String> = doc.tags.iter().cloned().collect();
        let records: Vec<ChunkRecord> = chunk_text(&doc.plain_text, &self.chunking)
            .enumerate()
            .map(|(chunk_index, chunk)| ChunkRecord {
                id: 0,
                doc_id: doc.doc_id,
                doc_path: doc.doc_path.clone(),
                doc_name: doc.doc_name.clone(),
                doc_type: doc.doc_type,
                tags: tags.clone(),
                chunk_index,
                start: chunk.start,
                end: chunk.end,
                text: chunk.text.to_string(),
            })
            .collect();
        debug!(doc = %doc.doc_path, chunks = records.len(), "chunked document");
        records
    }

    /// Source files under `root` with a configured extension, sorted by path.
    pub fn list_source_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let entries = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());
        for entry in entries {
            let path = entry.path();
            let matches = path.extension().and_then(|s| s.to_str()).is_some_and(|ext| {
                self.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext))
            });
            if matches {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    }
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}
