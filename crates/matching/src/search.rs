//! Vector search boundary and the bundled exact implementation.

use crate::embedder::normalize_l2_in_place;
use crate::types::MatchError;

/// One search hit: a similarity score and the corpus row it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredIndex {
    pub score: f32,
    pub index: usize,
}

/// Top-k cosine search over the indexed corpus rows.
///
/// Results come back in descending score order with ties broken by
/// ascending index, so rankings are stable and deterministic across
/// implementations. `len` must equal the number of indexed rows; the
/// selector checks it against the corpus at construction.
pub trait VectorSearch: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query with a unit-normalized vector. Callers own normalization.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredIndex>, MatchError>;
}

/// Exact cosine scan over all rows.
///
/// Linear in corpus size, which is fine for blueprint catalogs of a few
/// thousand references. Rows are normalized once at build time so a query
/// is a plain dot product per row.
#[derive(Debug, Clone)]
pub struct LinearSearch {
    dimension: usize,
    rows: Vec<Vec<f32>>,
}

impl LinearSearch {
    /// Build from raw embedding rows. Rows are L2-normalized here; a row
    /// that cannot be normalized (zero or non-finite norm) is kept as-is
    /// and will simply never score above zero.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, MatchError> {
        let dimension = rows.first().map(Vec::len).unwrap_or(0);
        let mut normalized = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() != dimension {
                return Err(MatchError::DimensionMismatch {
                    expected: dimension,
                    got: row.len(),
                });
            }
            if !normalize_l2_in_place(&mut row) {
                tracing::warn!(row = i, "corpus row has zero norm, kept unnormalized");
            }
            normalized.push(row);
        }
        Ok(Self {
            dimension,
            rows: normalized,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl VectorSearch for LinearSearch {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredIndex>, MatchError> {
        if query.len() != self.dimension {
            return Err(MatchError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        let mut hits: Vec<ScoredIndex> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| ScoredIndex {
                score: dot(query, row),
                index,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
