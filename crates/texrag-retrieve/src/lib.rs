//! Build and query paths on top of the index crate: the embedding build
//! pipeline, the nearest-neighbor retriever, and prompt assembly for an
//! external generator.

pub mod build;
pub mod engine;
pub mod prompt;
pub mod retriever;

pub use build::{rebuild, BuildReport, IndexBuilder};
pub use engine::{Answer, RagEngine};
pub use prompt::{build_context, build_prompt, ContextLimits, KeywordRouter, Prompt, PromptMode};
pub use retriever::{Retriever, ScoredChunk, DEFAULT_TOP_K};
