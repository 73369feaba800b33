//! Fixed-size overlapping character windows.
//!
//! Offsets are counted in characters, not bytes. A window whose trimmed text
//! is empty is skipped and does not consume a chunk index, so `chunk_index`
//! is not `start / step` in general.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 700,
            overlap: 150,
        }
    }
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let config = Self { size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".to_string()));
        }
        if self.overlap >= self.size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> usize {
        self.size.saturating_sub(self.overlap)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Lazy window iterator over one text. Cloning restarts from the clone point;
/// calling [`chunk_text`] again always yields the same sequence.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    // byte offset of every char, plus text.len() as the final entry
    boundaries: Vec<usize>,
    size: usize,
    step: usize,
    next_start: usize,
}

impl<'a> Chunks<'a> {
    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.char_len();
        while self.next_start < len {
            let start = self.next_start;
            let end = start.saturating_add(self.size).min(len);
            self.next_start = start.saturating_add(self.step);
            let window = &self.text[self.boundaries[start]..self.boundaries[end]];
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                return Some(TextChunk {
                    start,
                    end,
                    text: trimmed,
                });
            }
        }
        None
    }
}

/// Splits `text` into windows of `config.size` characters advancing by
/// `config.size - config.overlap`. The config is assumed valid.
pub fn chunk_text<'a>(text: &'a str, config: &ChunkingConfig) -> Chunks<'a> {
    let boundaries = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    Chunks {
        text,
        boundaries,
        size: config.size,
        step: config.step().max(1),
        next_start: 0,
    }
}
