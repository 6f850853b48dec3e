//! Florify blueprint matching layer.
//!
//! Given the embedding of an uploaded garden blueprint, this crate selects
//! the best-matching reference blueprint from a fixed corpus of
//! (empty, filled) pairs and resolves the filled counterpart's image for
//! downstream symbol detection.
//!
//! The two model-shaped collaborators are abstracted behind traits so the
//! heavy lifting stays external:
//!
//! - [`EmbeddingProvider`] turns image bytes into a fixed-length vector.
//! - [`VectorSearch`] answers top-k cosine queries over the corpus rows.
//!
//! [`LinearSearch`] is the bundled exact implementation; an ANN index can
//! plug in behind the same trait without touching the selector. When the
//! corpus or index cannot be loaded at startup, [`MatchSelector::degraded`]
//! keeps the rest of the pipeline exercisable by returning a fixed sentinel
//! match that is explicitly flagged as degraded.
//!
//! The corpus and search index are built once and shared read-only for the
//! life of the process; any refresh is a swap of the whole selector, never
//! an in-place edit.

mod corpus;
mod embedder;
mod search;
mod selector;
mod types;

pub use crate::corpus::{
    AssetStore, CorpusEntry, DirAssetStore, InMemoryAssetStore, ReferenceCorpus,
};
pub use crate::embedder::{normalize_l2_in_place, DegradedEmbedder, EmbeddingProvider, EMBEDDING_DIM};
pub use crate::search::{LinearSearch, ScoredIndex, VectorSearch};
pub use crate::selector::{MatchSelector, DEGRADED_SIMILARITY};
pub use crate::types::{MatchError, MatchOutcome};
