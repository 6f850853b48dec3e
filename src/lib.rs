//! Workspace umbrella crate for Florify blueprint processing.
//!
//! This crate stitches the domain layers together so callers can run the
//! whole garden-blueprint pipeline through a single API entry point:
//! embedding match selection, symbol detection on the matched reference,
//! detection aggregation, and overlay projection.
//!
//! The two model-shaped collaborators (embedding extraction and symbol
//! detection) stay behind traits; [`GardenPipeline`] is constructed once
//! with explicit instances and shared read-only across requests.

pub use detection::{
    Aggregated, BoundingBox, CSV_HEADER, DegradedDetector, DetectError, DetectionSummary,
    ParsedDetection, RawDetection, SizeDistribution, SymbolDetector, aggregate, export_csv,
    summarize,
};
pub use labels::{Category, ClassProperties, GrowthType, LeafType, PlantSize, parse};
pub use matching::{
    AssetStore, CorpusEntry, DEGRADED_SIMILARITY, DegradedEmbedder, DirAssetStore, EMBEDDING_DIM,
    EmbeddingProvider, InMemoryAssetStore, LinearSearch, MatchError, MatchOutcome, MatchSelector,
    ReferenceCorpus, ScoredIndex, VectorSearch, normalize_l2_in_place,
};
pub use overlay::{
    DEFAULT_COLOR, OverlayError, OverlayMarker, annotate, build_overlay, category_color,
};

mod config;
mod pipeline;

pub use crate::config::PipelineConfig;
pub use crate::pipeline::{GardenPipeline, PipelineOutcome, PipelineRequest};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Errors that can occur while driving one request through the pipeline.
///
/// Each variant names the stage that failed; expected domain outcomes
/// (below-threshold match, zero detections) are not errors and flow
/// through [`PipelineOutcome`] instead.
#[derive(Debug)]
pub enum PipelineError {
    /// Embedding extraction collaborator failed.
    Embed(MatchError),
    /// Match selection failed (integrity or search failure).
    Match(MatchError),
    /// Detection collaborator failed on the matched reference.
    Detect(DetectError),
    /// Pipeline configuration rejected at construction.
    Config(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Embed(err) => write!(f, "embedding failure: {err}"),
            PipelineError::Match(err) => write!(f, "match failure: {err}"),
            PipelineError::Detect(err) => write!(f, "detection failure: {err}"),
            PipelineError::Config(msg) => write!(f, "pipeline config error: {msg}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Embed(err) | PipelineError::Match(err) => Some(err),
            PipelineError::Detect(err) => Some(err),
            PipelineError::Config(_) => None,
        }
    }
}

impl From<DetectError> for PipelineError {
    fn from(value: DetectError) -> Self {
        PipelineError::Detect(value)
    }
}

/// Metrics observer for pipeline stages.
///
/// Install one process-wide with [`set_pipeline_metrics`]; each stage
/// reports its latency and whether it succeeded.
pub trait PipelineMetrics: Send + Sync {
    fn record_embed(&self, latency: Duration, ok: bool);
    fn record_match(&self, latency: Duration, ok: bool);
    fn record_detect(&self, latency: Duration, ok: bool);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("pipeline metrics lock poisoned");
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_embed(self, ok: bool) {
        self.recorder.record_embed(self.start.elapsed(), ok);
    }

    pub(crate) fn record_match(self, ok: bool) {
        self.recorder.record_match(self.start.elapsed(), ok);
    }

    pub(crate) fn record_detect(self, ok: bool) {
        self.recorder.record_detect(self.start.elapsed(), ok);
    }
}
