//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Tunables for one pipeline instance.
///
/// Per-request overrides (thresholds) layer on top of these defaults at
/// the request boundary; the instance config itself never changes after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum cosine similarity to accept a reference match.
    #[serde(default = "PipelineConfig::default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Confidence floor passed to the symbol detector.
    #[serde(default = "PipelineConfig::default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Candidates requested from the vector search; only the top-1 decides.
    #[serde(default = "PipelineConfig::default_top_k")]
    pub top_k: usize,
}

impl PipelineConfig {
    pub(crate) fn default_similarity_threshold() -> f32 {
        0.7
    }

    pub(crate) fn default_confidence_threshold() -> f32 {
        0.25
    }

    pub(crate) fn default_top_k() -> usize {
        1
    }

    /// Validate the configuration once at pipeline construction.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(PipelineError::Config(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PipelineError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(PipelineError::Config(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: Self::default_similarity_threshold(),
            confidence_threshold: Self::default_confidence_threshold(),
            top_k: Self::default_top_k(),
        }
    }
}
