//! Two-stage orchestration: match the blueprint, detect on the matched
//! reference, then derive summary, export, and overlay.

use std::sync::Arc;

use detection::{Aggregated, SymbolDetector, aggregate};
use matching::{EmbeddingProvider, MatchOutcome, MatchSelector};
use overlay::{OverlayMarker, annotate, build_overlay};

use crate::config::PipelineConfig;
use crate::{MetricsSpan, PipelineError};

/// One pipeline invocation's input.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// The non-skinned source blueprint to match against the corpus.
    pub source_image: Vec<u8>,
    /// Optional skinned display variant. Carried through for the caller;
    /// markers are positioned in the detected image's pixel space either
    /// way.
    pub display_image: Option<Vec<u8>>,
    pub similarity_threshold: f32,
    pub confidence_threshold: f32,
}

impl PipelineRequest {
    /// Request with instance defaults for both thresholds.
    pub fn new(source_image: Vec<u8>, config: &PipelineConfig) -> Self {
        Self {
            source_image,
            display_image: None,
            similarity_threshold: config.similarity_threshold,
            confidence_threshold: config.confidence_threshold,
        }
    }
}

/// Terminal state of one pipeline invocation.
///
/// Every terminal state short of a collaborator failure is a success:
/// `NoMatch` and a skipped detection leave the downstream fields `None`,
/// while an empty detection list still produces an (empty) overlay and a
/// header-only export. The distinction between "no symbols found" and
/// "detection not attempted" is preserved.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub match_outcome: MatchOutcome,
    /// Parsed detections, summary, and CSV; `None` when detection never
    /// ran (no match, or matched without a filled asset payload).
    pub detection: Option<Aggregated>,
    /// Overlay markers; `None` exactly when `detection` is `None`.
    pub overlay: Option<Vec<OverlayMarker>>,
    /// PNG render of the detected boxes over the matched reference.
    /// Side output; rendering failure degrades to `None` without failing
    /// the request.
    pub annotated_image: Option<Vec<u8>>,
    /// Reason detection was skipped despite a logical match.
    pub detection_skipped: Option<String>,
}

/// The orchestrator: embed, select, detect, aggregate, project.
///
/// Collaborators are injected once at construction and shared read-only;
/// concurrent invocations keep fully independent per-call state. There is
/// no internal retry: a failed collaborator call is terminal for that
/// request and the caller decides what to do next.
pub struct GardenPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    selector: Arc<MatchSelector>,
    detector: Arc<dyn SymbolDetector>,
    config: PipelineConfig,
}

impl GardenPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        selector: Arc<MatchSelector>,
        detector: Arc<dyn SymbolDetector>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            embedder,
            selector,
            detector,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_degraded(&self) -> bool {
        self.embedder.degraded() || self.selector.is_degraded() || self.detector.degraded()
    }

    /// Run the matching phase alone: embed the image and select the best
    /// reference.
    pub fn match_blueprint(
        &self,
        image: &[u8],
        similarity_threshold: f32,
    ) -> Result<MatchOutcome, PipelineError> {
        let span = MetricsSpan::start();
        let embedding = match self.embedder.embed(image) {
            Ok(embedding) => {
                if let Some(span) = span {
                    span.record_embed(true);
                }
                embedding
            }
            Err(err) => {
                if let Some(span) = span {
                    span.record_embed(false);
                }
                return Err(PipelineError::Embed(err));
            }
        };

        let span = MetricsSpan::start();
        match self
            .selector
            .find_match(&embedding, similarity_threshold, self.config.top_k)
        {
            Ok(outcome) => {
                if let Some(span) = span {
                    span.record_match(true);
                }
                Ok(outcome)
            }
            Err(err) => {
                if let Some(span) = span {
                    span.record_match(false);
                }
                Err(PipelineError::Match(err))
            }
        }
    }

    /// Run the detection phase alone on an already-resolved image.
    pub fn detect_symbols(
        &self,
        image: &[u8],
        confidence_threshold: f32,
    ) -> Result<Aggregated, PipelineError> {
        let span = MetricsSpan::start();
        match self.detector.detect(image, confidence_threshold) {
            Ok(raw) => {
                if let Some(span) = span {
                    span.record_detect(true);
                }
                Ok(aggregate(raw))
            }
            Err(err) => {
                if let Some(span) = span {
                    span.record_detect(false);
                }
                Err(PipelineError::Detect(err))
            }
        }
    }

    /// Run the full pipeline for one request.
    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        let match_outcome =
            self.match_blueprint(&request.source_image, request.similarity_threshold)?;

        let filled_image = match &match_outcome {
            MatchOutcome::NoMatch { best_similarity } => {
                tracing::info!(best_similarity = *best_similarity, "no confident reference match");
                return Ok(PipelineOutcome {
                    match_outcome,
                    detection: None,
                    overlay: None,
                    annotated_image: None,
                    detection_skipped: None,
                });
            }
            MatchOutcome::Matched {
                filled_image: None,
                reference_index,
                ..
            } => {
                // A logical match without a payload cannot feed the
                // detector; report the gap instead of detecting on nothing.
                tracing::warn!(
                    reference_index = *reference_index,
                    "matched reference has no filled asset"
                );
                return Ok(PipelineOutcome {
                    match_outcome,
                    detection: None,
                    overlay: None,
                    annotated_image: None,
                    detection_skipped: Some(
                        "matched reference has no filled asset payload".to_string(),
                    ),
                });
            }
            MatchOutcome::Matched {
                filled_image: Some(bytes),
                ..
            } => bytes.clone(),
        };

        let aggregated = self.detect_symbols(&filled_image, request.confidence_threshold)?;
        let markers = build_overlay(&aggregated.detections);
        let annotated_image = match annotate(&filled_image, &aggregated.detections) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(error = %err, "annotated render failed, continuing without it");
                None
            }
        };

        tracing::info!(
            detections = aggregated.detections.len(),
            markers = markers.len(),
            "pipeline completed"
        );

        Ok(PipelineOutcome {
            match_outcome,
            detection: Some(aggregated),
            overlay: Some(markers),
            annotated_image,
            detection_skipped: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::{BoundingBox, DetectError, RawDetection};
    use matching::{InMemoryAssetStore, MatchError, ReferenceCorpus, ScoredIndex, VectorSearch};

    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    impl EmbeddingProvider for FixedEmbedder {
        fn dimension(&self) -> usize {
            self.vector.len()
        }

        fn embed(&self, _image: &[u8]) -> Result<Vec<f32>, MatchError> {
            Ok(self.vector.clone())
        }
    }

    struct FailingEmbedder;

    impl EmbeddingProvider for FailingEmbedder {
        fn dimension(&self) -> usize {
            4
        }

        fn embed(&self, _image: &[u8]) -> Result<Vec<f32>, MatchError> {
            Err(MatchError::Embedding("extractor offline".to_string()))
        }
    }

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

    struct FixedDetector {
        detections: Vec<RawDetection>,
    }

    impl SymbolDetector for FixedDetector {
        fn detect(
            &self,
            _image: &[u8],
            _confidence_threshold: f32,
        ) -> Result<Vec<RawDetection>, DetectError> {
            Ok(self.detections.clone())
        }
    }

    struct FailingDetector;

    impl SymbolDetector for FailingDetector {
        fn detect(
            &self,
            _image: &[u8],
            _confidence_threshold: f32,
        ) -> Result<Vec<RawDetection>, DetectError> {
            Err(DetectError::Inference("model not loaded".to_string()))
        }
    }

    fn corpus(n: usize) -> ReferenceCorpus {
        ReferenceCorpus::new(
            (0..n)
                .map(|i| matching::CorpusEntry {
                    empty_id: format!("empty/{i:04}.png"),
                    filled_id: format!("filled/{i:04}.png"),
                })
                .collect(),
        )
    }

    fn selector(hits: Vec<ScoredIndex>, n: usize, assets: InMemoryAssetStore) -> Arc<MatchSelector> {
        Arc::new(
            MatchSelector::new(Box::new(FixedSearch { len: n, hits }), corpus(n), Arc::new(assets))
                .expect("selector"),
        )
    }

    fn sample_detection(label: &str) -> RawDetection {
        RawDetection {
            bbox: BoundingBox {
                x1: 1.0,
                y1: 2.0,
                x2: 11.0,
                y2: 22.0,
            },
            confidence: 0.9,
            label: label.to_string(),
        }
    }

    fn pipeline(
        selector: Arc<MatchSelector>,
        detector: Arc<dyn SymbolDetector>,
    ) -> GardenPipeline {
        GardenPipeline::new(
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0],
            }),
            selector,
            detector,
            PipelineConfig::default(),
        )
        .expect("pipeline")
    }

    #[test]
    fn matched_request_runs_all_stages() {
        let assets = InMemoryAssetStore::with_filled(vec![Some(b"filled".to_vec())]);
        let p = pipeline(
            selector(vec![ScoredIndex { score: 0.92, index: 0 }], 1, assets),
            Arc::new(FixedDetector {
                detections: vec![sample_detection("Tree_Height1"), sample_detection("FlowerPot")],
            }),
        );
        let outcome = p
            .run(&PipelineRequest::new(b"query".to_vec(), p.config()))
            .expect("pipeline run");

        assert!(outcome.match_outcome.is_matched());
        let detection = outcome.detection.expect("detection phase ran");
        assert_eq!(detection.detections.len(), 2);
        assert_eq!(outcome.overlay.expect("overlay built").len(), 2);
        assert_eq!(detection.csv.lines().count(), 3);
        assert!(outcome.detection_skipped.is_none());
    }

    #[test]
    fn no_match_is_terminal_partial_success() {
        let p = pipeline(
            selector(
                vec![ScoredIndex { score: 0.4, index: 0 }],
                1,
                InMemoryAssetStore::default(),
            ),
            Arc::new(FixedDetector { detections: vec![] }),
        );
        let outcome = p
            .run(&PipelineRequest::new(b"query".to_vec(), p.config()))
            .expect("partial success");

        assert!(!outcome.match_outcome.is_matched());
        assert!(outcome.detection.is_none());
        assert!(outcome.overlay.is_none());
        assert!(outcome.annotated_image.is_none());
        assert!(outcome.detection_skipped.is_none());
    }

    #[test]
    fn missing_filled_payload_skips_detection_with_reason() {
        let p = pipeline(
            selector(
                vec![ScoredIndex { score: 0.9, index: 0 }],
                1,
                InMemoryAssetStore::default(),
            ),
            Arc::new(FixedDetector {
                detections: vec![sample_detection("Tree_Height1")],
            }),
        );
        let outcome = p
            .run(&PipelineRequest::new(b"query".to_vec(), p.config()))
            .expect("partial success");

        assert!(outcome.match_outcome.is_matched());
        assert!(outcome.detection.is_none());
        assert!(outcome.overlay.is_none());
        let reason = outcome.detection_skipped.expect("skip reason recorded");
        assert!(reason.contains("filled asset"));
    }

    #[test]
    fn empty_detection_list_still_builds_empty_overlay() {
        let assets = InMemoryAssetStore::with_filled(vec![Some(b"filled".to_vec())]);
        let p = pipeline(
            selector(vec![ScoredIndex { score: 0.8, index: 0 }], 1, assets),
            Arc::new(FixedDetector { detections: vec![] }),
        );
        let outcome = p
            .run(&PipelineRequest::new(b"query".to_vec(), p.config()))
            .expect("pipeline run");

        let detection = outcome.detection.expect("detection phase ran");
        assert!(detection.detections.is_empty());
        // "No symbols found" is distinct from "no detection attempted".
        assert_eq!(outcome.overlay.expect("overlay present"), vec![]);
        assert!(outcome.detection_skipped.is_none());
    }

    #[test]
    fn embed_failure_is_terminal() {
        let assets = InMemoryAssetStore::with_filled(vec![Some(b"filled".to_vec())]);
        let p = GardenPipeline::new(
            Arc::new(FailingEmbedder),
            selector(vec![ScoredIndex { score: 0.9, index: 0 }], 1, assets),
            Arc::new(FixedDetector { detections: vec![] }),
            PipelineConfig::default(),
        )
        .expect("pipeline");
        let err = p
            .run(&PipelineRequest::new(b"query".to_vec(), p.config()))
            .expect_err("embed failure propagates");
        assert!(matches!(err, PipelineError::Embed(_)));
    }

    #[test]
    fn detect_failure_is_terminal() {
        let assets = InMemoryAssetStore::with_filled(vec![Some(b"filled".to_vec())]);
        let p = pipeline(
            selector(vec![ScoredIndex { score: 0.9, index: 0 }], 1, assets),
            Arc::new(FailingDetector),
        );
        let err = p
            .run(&PipelineRequest::new(b"query".to_vec(), p.config()))
            .expect_err("detect failure propagates");
        assert!(matches!(err, PipelineError::Detect(_)));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let assets = InMemoryAssetStore::default();
        let err = GardenPipeline::new(
            Arc::new(FixedEmbedder { vector: vec![1.0] }),
            selector(vec![], 1, assets),
            Arc::new(FixedDetector { detections: vec![] }),
            PipelineConfig {
                confidence_threshold: 2.0,
                ..PipelineConfig::default()
            },
        )
        .err()
        .expect("invalid config");
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
