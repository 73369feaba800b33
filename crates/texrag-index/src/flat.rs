//! Exact brute-force L2 index with a checksummed binary file format.
//!
//! Layout (little endian):
//!
//! | field   | type        |
//! |---------|-------------|
//! | magic   | u32 `TXRV`  |
//! | version | u16         |
//! | dim     | u32         |
//! | rows    | u64         |
//! | digest  | 32 bytes    |
//! | payload | rows*dim f32|
//!
//! The digest is blake3 over the payload bytes.

use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

use texrag_core::traits::VectorIndex;
use texrag_core::types::Neighbor;
use texrag_core::{Error, Result};

pub const MAGIC: u32 = u32::from_le_bytes(*b"TXRV");
pub const FORMAT_VERSION: u16 = 1;
const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = 4 + 2 + 4 + 8 + DIGEST_LEN;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndex {
    dim: Option<usize>,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index whose dimension is fixed up front.
    pub fn with_dim(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("index dimension must be positive".to_string()));
        }
        Ok(Self {
            dim: Some(dim),
            data: Vec::new(),
        })
    }

    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        let dim = self.dim?;
        self.data.get(row * dim..(row + 1) * dim)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes).map_err(|e| match e {
            Error::CorruptIndex(msg) => Error::CorruptIndex(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let dim = self.dim.unwrap_or(0);
        let rows = self.len();
        let mut payload = Vec::with_capacity(self.data.len() * 4);
        for v in &self.data {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        let digest = blake3::hash(&payload);

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(dim as u32).to_le_bytes());
        out.extend_from_slice(&(rows as u64).to_le_bytes());
        out.extend_from_slice(digest.as_bytes());
        out.extend_from_slice(&payload);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(corrupt(format!("truncated header ({} bytes)", bytes.len())));
        }
        let magic = u32::from_le_bytes(read_array(bytes, 0));
        if magic != MAGIC {
            return Err(corrupt(format!("bad magic {:#010x}", magic)));
        }
        let version = u16::from_le_bytes(read_array(bytes, 4));
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {}", version)));
        }
        let dim = u32::from_le_bytes(read_array(bytes, 6)) as usize;
        let rows = u64::from_le_bytes(read_array(bytes, 10));
        let digest: [u8; DIGEST_LEN] = read_array(bytes, 18);

        if dim == 0 && rows > 0 {
            return Err(corrupt(format!("{} rows with zero dimension", rows)));
        }
        let expected = usize::try_from(rows)
            .ok()
            .and_then(|r| r.checked_mul(dim))
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt(format!("row count {} overflows", rows)))?;
        let payload = &bytes[HEADER_LEN..];
        match payload.len().cmp(&expected) {
            Ordering::Less => {
                return Err(corrupt(format!(
                    "truncated payload: {} of {} bytes",
                    payload.len(),
                    expected
                )))
            }
            Ordering::Greater => {
                return Err(corrupt(format!("{} trailing bytes", payload.len() - expected)))
            }
            Ordering::Equal => {}
        }
        if blake3::hash(payload).as_bytes() != &digest {
            return Err(corrupt("payload checksum mismatch".to_string()));
        }

        let data = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self {
            dim: (dim > 0).then_some(dim),
            data,
        })
    }
}

fn corrupt(msg: String) -> Error {
    Error::CorruptIndex(msg)
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> Option<usize> {
        self.dim
    }

    fn len(&self) -> usize {
        match self.dim {
            Some(d) => self.data.len() / d,
            None => 0,
        }
    }

    /// All-or-nothing: a batch with any mismatched vector adds nothing.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let Some(first) = vectors.first() else {
            return Ok(());
        };
        let dim = match self.dim {
            Some(d) => d,
            None if first.is_empty() => {
                return Err(Error::InvalidConfig("cannot index zero-length vectors".to_string()))
            }
            None => first.len(),
        };
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        self.dim = Some(dim);
        self.data.reserve(vectors.len() * dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let Some(dim) = self.dim else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }
        if k == 0 || self.data.is_empty() {
            return Ok(Vec::new());
        }
        if query.iter().any(|x| !x.is_finite()) {
            warn!("query vector has non-finite components, returning no neighbors");
            return Ok(Vec::new());
        }

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(dim)
            .enumerate()
            .map(|(row, v)| Neighbor {
                row: row as i64,
                distance: squared_l2(query, v),
            })
            .collect();
        let by_distance = |a: &Neighbor, b: &Neighbor| {
            a.distance.total_cmp(&b.distance).then(a.row.cmp(&b.row))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_by(by_distance);
        Ok(scored)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&self.to_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!(
            path = %path.display(),
            rows = self.len(),
            dim = self.dim.unwrap_or(0),
            "saved vector index"
        );
        Ok(())
    }
}

/// Scales `v` to unit length in place; zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
