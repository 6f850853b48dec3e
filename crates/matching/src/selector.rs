//! Match selection over the reference corpus.

use std::sync::Arc;

use crate::corpus::{AssetStore, ReferenceCorpus};
use crate::embedder::normalize_l2_in_place;
use crate::search::VectorSearch;
use crate::types::{MatchError, MatchOutcome};

/// Similarity reported by the degraded sentinel match.
pub const DEGRADED_SIMILARITY: f32 = 0.85;

const DEGRADED_INDEX: usize = 0;

enum Backend {
    Live(Box<dyn VectorSearch>),
    /// No usable index/corpus; every call returns the fixed sentinel.
    Degraded,
}

/// Decides whether an uploaded blueprint matches a known reference.
///
/// Holds the search index, the pair corpus, and the asset store, all
/// read-only after construction; one selector serves concurrent requests
/// without coordination.
pub struct MatchSelector {
    backend: Backend,
    corpus: ReferenceCorpus,
    assets: Arc<dyn AssetStore>,
}

impl std::fmt::Debug for MatchSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSelector")
            .field("degraded", &matches!(self.backend, Backend::Degraded))
            .field("corpus", &self.corpus)
            .finish_non_exhaustive()
    }
}

impl MatchSelector {
    /// Construct a live selector.
    ///
    /// The corpus must be non-empty and aligned 1:1 with the index rows;
    /// either violation is a fatal configuration error, not something to
    /// degrade around.
    pub fn new(
        search: Box<dyn VectorSearch>,
        corpus: ReferenceCorpus,
        assets: Arc<dyn AssetStore>,
    ) -> Result<Self, MatchError> {
        if corpus.is_empty() {
            return Err(MatchError::EmptyCorpus);
        }
        if search.len() != corpus.len() {
            return Err(MatchError::CorpusIndexMismatch {
                corpus: corpus.len(),
                index: search.len(),
            });
        }
        Ok(Self {
            backend: Backend::Live(search),
            corpus,
            assets,
        })
    }

    /// Construct the degraded fallback used when the index or corpus is
    /// unavailable at startup. Every call yields the sentinel pairing so
    /// downstream stages stay exercisable; outcomes carry `degraded: true`
    /// so callers can never mistake them for genuine matches.
    pub fn degraded(assets: Arc<dyn AssetStore>) -> Self {
        tracing::warn!("match selector running in degraded mode, returning sentinel matches");
        Self {
            backend: Backend::Degraded,
            corpus: ReferenceCorpus::sentinel(),
            assets,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.backend, Backend::Degraded)
    }

    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    /// Find the best reference for `embedding`, accepting it only at
    /// `similarity >= threshold`.
    pub fn find_match(
        &self,
        embedding: &[f32],
        threshold: f32,
        k: usize,
    ) -> Result<MatchOutcome, MatchError> {
        let search = match &self.backend {
            Backend::Degraded => return Ok(self.sentinel_outcome()),
            Backend::Live(search) => search,
        };

        // Guard against an upstream extractor handing us raw features.
        let mut query = embedding.to_vec();
        if !normalize_l2_in_place(&mut query) {
            tracing::warn!("query embedding has zero norm, similarity will be zero");
        }

        let hits = search.search(&query, k.max(1))?;
        let top = match hits.first() {
            Some(top) => *top,
            None => {
                return Ok(MatchOutcome::NoMatch {
                    best_similarity: -1.0,
                })
            }
        };

        if top.score < threshold {
            tracing::debug!(
                best_similarity = top.score,
                threshold,
                "no reference above threshold"
            );
            return Ok(MatchOutcome::NoMatch {
                best_similarity: top.score,
            });
        }

        if top.index >= self.corpus.len() {
            tracing::error!(
                index = top.index,
                corpus_len = self.corpus.len(),
                "search returned out-of-range reference index"
            );
            return Err(MatchError::ReferenceIndexOutOfRange {
                index: top.index,
                len: self.corpus.len(),
            });
        }

        let filled_image = self.resolve_filled(top.index);
        Ok(MatchOutcome::Matched {
            reference_index: top.index,
            similarity: top.score,
            filled_image,
            degraded: false,
        })
    }

    /// Resolve the filled asset for a matched index. Failures degrade to
    /// `None`: the match decision already stands.
    fn resolve_filled(&self, index: usize) -> Option<Vec<u8>> {
        match self.assets.filled(index) {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => {
                tracing::warn!(index, "matched reference has no filled asset");
                None
            }
            Err(err) => {
                tracing::warn!(index, error = %err, "filled asset resolution failed");
                None
            }
        }
    }

    fn sentinel_outcome(&self) -> MatchOutcome {
        MatchOutcome::Matched {
            reference_index: DEGRADED_INDEX,
            similarity: DEGRADED_SIMILARITY,
            filled_image: self.resolve_filled(DEGRADED_INDEX),
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusEntry, InMemoryAssetStore};
    use crate::search::ScoredIndex;

    /// Search stub returning a canned hit list.
    struct FixedSearch {
        len: usize,
        hits: Vec<ScoredIndex>,
    }

    impl VectorSearch for FixedSearch {
        fn len(&self) -> usize {
            self.len
        }

        fn search(&self, _query: &[f32], k: usize) -> Result<Vec<ScoredIndex>, MatchError> {
            Ok(self.hits.iter().copied().take(k).collect())
        }
    }

    fn corpus(n: usize) -> ReferenceCorpus {
        ReferenceCorpus::new(
            (0..n)
                .map(|i| CorpusEntry {
                    empty_id: format!("empty/{i:04}.png"),
                    filled_id: format!("filled/{i:04}.png"),
                })
                .collect(),
        )
    }

    fn selector_with(hits: Vec<ScoredIndex>, n: usize, assets: InMemoryAssetStore) -> MatchSelector {
        MatchSelector::new(
            Box::new(FixedSearch { len: n, hits }),
            corpus(n),
            Arc::new(assets),
        )
        .expect("aligned selector")
    }

    #[test]
    fn score_equal_to_threshold_is_accepted() {
        let selector = selector_with(
            vec![ScoredIndex {
                score: 0.7,
                index: 1,
            }],
            3,
            InMemoryAssetStore::default(),
        );
        let outcome = selector.find_match(&[1.0, 0.0], 0.7, 1).expect("match");
        match outcome {
            MatchOutcome::Matched {
                reference_index,
                similarity,
                degraded,
                ..
            } => {
                assert_eq!(reference_index, 1);
                assert!((similarity - 0.7).abs() < 1e-6);
                assert!(!degraded);
            }
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn score_below_threshold_is_no_match() {
        let selector = selector_with(
            vec![ScoredIndex {
                score: 0.699,
                index: 0,
            }],
            2,
            InMemoryAssetStore::default(),
        );
        let outcome = selector.find_match(&[1.0, 0.0], 0.7, 1).expect("outcome");
        match outcome {
            MatchOutcome::NoMatch { best_similarity } => {
                assert!((best_similarity - 0.699).abs() < 1e-6);
            }
            other => panic!("expected NoMatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_hit_list_is_no_match_at_floor() {
        let selector = selector_with(vec![], 2, InMemoryAssetStore::default());
        let outcome = selector.find_match(&[1.0, 0.0], 0.7, 1).expect("outcome");
        assert_eq!(
            outcome,
            MatchOutcome::NoMatch {
                best_similarity: -1.0
            }
        );
    }

    #[test]
    fn out_of_range_index_is_integrity_error() {
        let selector = selector_with(
            vec![ScoredIndex {
                score: 0.95,
                index: 99,
            }],
            2,
            InMemoryAssetStore::default(),
        );
        let err = selector
            .find_match(&[1.0, 0.0], 0.7, 1)
            .expect_err("integrity failure");
        assert!(matches!(
            err,
            MatchError::ReferenceIndexOutOfRange { index: 99, len: 2 }
        ));
    }

    #[test]
    fn missing_filled_asset_keeps_the_match() {
        let selector = selector_with(
            vec![ScoredIndex {
                score: 0.9,
                index: 0,
            }],
            1,
            InMemoryAssetStore::default(),
        );
        match selector.find_match(&[1.0], 0.7, 1).expect("match") {
            MatchOutcome::Matched { filled_image, .. } => assert!(filled_image.is_none()),
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn resolved_filled_asset_is_attached() {
        let assets = InMemoryAssetStore::with_filled(vec![Some(b"filled".to_vec())]);
        let selector = selector_with(
            vec![ScoredIndex {
                score: 0.8,
                index: 0,
            }],
            1,
            assets,
        );
        match selector.find_match(&[1.0], 0.7, 1).expect("match") {
            MatchOutcome::Matched { filled_image, .. } => {
                assert_eq!(filled_image, Some(b"filled".to_vec()));
            }
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn misaligned_corpus_fails_construction() {
        let err = MatchSelector::new(
            Box::new(FixedSearch {
                len: 4,
                hits: vec![],
            }),
            corpus(3),
            Arc::new(InMemoryAssetStore::default()),
        )
        .err()
        .expect("misaligned");
        assert!(matches!(
            err,
            MatchError::CorpusIndexMismatch {
                corpus: 3,
                index: 4
            }
        ));
    }

    #[test]
    fn empty_corpus_fails_construction() {
        let err = MatchSelector::new(
            Box::new(FixedSearch {
                len: 0,
                hits: vec![],
            }),
            ReferenceCorpus::new(vec![]),
            Arc::new(InMemoryAssetStore::default()),
        )
        .err()
        .expect("empty corpus");
        assert!(matches!(err, MatchError::EmptyCorpus));
    }

    #[test]
    fn degraded_selector_returns_flagged_sentinel() {
        let assets = InMemoryAssetStore::with_filled(vec![Some(b"sample".to_vec())]);
        let selector = MatchSelector::degraded(Arc::new(assets));
        assert!(selector.is_degraded());
        match selector.find_match(&[0.0; 4], 0.99, 1).expect("sentinel") {
            MatchOutcome::Matched {
                reference_index,
                similarity,
                filled_image,
                degraded,
            } => {
                assert_eq!(reference_index, 0);
                assert!((similarity - DEGRADED_SIMILARITY).abs() < 1e-6);
                assert_eq!(filled_image, Some(b"sample".to_vec()));
                assert!(degraded);
            }
            other => panic!("expected sentinel Matched, got {other:?}"),
        }
    }
}
