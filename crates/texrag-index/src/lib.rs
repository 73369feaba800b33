//! Vector and metadata persistence for texrag.
//!
//! - `flat`: exact L2 [`FlatIndex`] and its binary format
//! - `metadata`: row-ordered [`MetadataStore`]
//! - `snapshot`: atomic publication and integrity-checked loading of both

pub mod flat;
pub mod metadata;
pub mod snapshot;

pub use flat::{l2_normalize, FlatIndex};
pub use metadata::MetadataStore;
pub use snapshot::{check_integrity, current_generation, Snapshot};
