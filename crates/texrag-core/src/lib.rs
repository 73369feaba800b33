//! texrag-core
//!
//! Shared domain types, capability traits, configuration and the pure
//! build-time stages: normalization, chunking, classification and corpus
//! ingestion.

pub mod chunker;
pub mod classify;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod normalize;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
