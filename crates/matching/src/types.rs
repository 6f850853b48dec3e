use thiserror::Error;

/// Outcome of one match call.
///
/// A below-threshold best score is the expected `NoMatch` domain outcome,
/// not an error; only integrity and collaborator failures surface as
/// [`MatchError`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The top-1 reference cleared the similarity threshold.
    Matched {
        /// Position of the matched pair in the reference corpus.
        reference_index: usize,
        /// Cosine similarity of the accepted match, in `[-1, 1]`.
        similarity: f32,
        /// The paired filled blueprint, when the asset store could resolve
        /// it. Resolution failure is non-fatal: the match decision stands
        /// and callers decide how to degrade.
        filled_image: Option<Vec<u8>>,
        /// True only for the fixed sentinel produced in degraded mode.
        /// Never set on a genuine similarity match.
        degraded: bool,
    },
    /// Best observed score stayed below the threshold.
    NoMatch {
        /// Top-1 score for diagnostics; `-1.0` when the search returned no
        /// candidates at all.
        best_similarity: f32,
    },
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The reference corpus has no entries.
    #[error("reference corpus is empty")]
    EmptyCorpus,

    /// Corpus pairs and index rows no longer line up. Fatal configuration
    /// error: positions are the join key between the two.
    #[error("corpus/index misaligned: {corpus} pairs vs {index} indexed vectors")]
    CorpusIndexMismatch { corpus: usize, index: usize },

    /// The search returned a row outside the corpus. Data-integrity
    /// failure, reported rather than wrapped around or defaulted.
    #[error("matched reference index {index} outside corpus of {len} pairs")]
    ReferenceIndexOutOfRange { index: usize, len: usize },

    /// Query or row vector length differs from the index dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Embedding extraction collaborator failed.
    #[error("embedding extraction failed: {0}")]
    Embedding(String),

    /// Vector search collaborator failed.
    #[error("vector search failed: {0}")]
    Search(String),

    /// Asset store could not be read (not the per-entry "absent" case).
    #[error("asset store error: {0}")]
    Asset(String),

    /// Corpus file missing or malformed.
    #[error("corpus load failed: {0}")]
    CorpusLoad(String),
}
