//! Embedding extraction boundary.

use crate::types::MatchError;

/// Feature width of the production extractor (MobileNetV2 penultimate
/// layer). Degraded embedders default to the same width so a corpus built
/// in one mode stays queryable in the other.
pub const EMBEDDING_DIM: usize = 1280;

/// Converts image bytes into a fixed-length feature vector.
///
/// Implementations must be deterministic for identical input so matching
/// stays reproducible. Vectors need not arrive normalized; the selector
/// normalizes before querying.
pub trait EmbeddingProvider: Send + Sync {
    fn dimension(&self) -> usize;

    fn embed(&self, image: &[u8]) -> Result<Vec<f32>, MatchError>;

    /// True for stand-in implementations used when the real extractor is
    /// unavailable.
    fn degraded(&self) -> bool {
        false
    }
}

/// Deterministic stand-in extractor for setups without the real model.
///
/// Folds the byte content into a fixed-width accumulator, so identical
/// images embed identically and different images usually do not. Not a
/// semantic embedding; good enough to exercise the match path end to end.
#[derive(Debug, Clone)]
pub struct DegradedEmbedder {
    dimension: usize,
}

impl DegradedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for DegradedEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl EmbeddingProvider for DegradedEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, image: &[u8]) -> Result<Vec<f32>, MatchError> {
        if self.dimension == 0 {
            return Err(MatchError::Embedding(
                "degraded embedder configured with zero dimension".to_string(),
            ));
        }
        let mut vector = vec![0.0f32; self.dimension];
        for (i, byte) in image.iter().enumerate() {
            vector[i % self.dimension] += f32::from(*byte) / 255.0;
        }
        Ok(vector)
    }

    fn degraded(&self) -> bool {
        true
    }
}

/// Normalize a vector to unit L2 norm in place.
///
/// Returns whether the norm was positive and finite; the vector is left
/// untouched otherwise, so zero vectors stay zero instead of becoming NaN.
pub fn normalize_l2_in_place(values: &mut [f32]) -> bool {
    let mut sum = 0.0f32;
    for value in values.iter() {
        sum += value * value;
    }
    if !sum.is_finite() || sum <= 0.0 {
        return false;
    }
    let norm = sum.sqrt();
    for value in values {
        *value /= norm;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_norm() {
        let mut values = vec![3.0, 4.0];
        assert!(normalize_l2_in_place(&mut values));
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut values = vec![0.0, 0.0, 0.0];
        assert!(!normalize_l2_in_place(&mut values));
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn degraded_embedder_is_deterministic() {
        let embedder = DegradedEmbedder::new(16);
        let a = embedder.embed(b"same bytes").expect("embed");
        let b = embedder.embed(b"same bytes").expect("embed");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(embedder.degraded());
    }

    #[test]
    fn degraded_embedder_separates_different_content() {
        let embedder = DegradedEmbedder::new(16);
        let a = embedder.embed(b"blueprint one").expect("embed");
        let b = embedder.embed(b"a different plan").expect("embed");
        assert_ne!(a, b);
    }
}
