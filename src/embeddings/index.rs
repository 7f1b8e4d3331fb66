//! Nearest-neighbour index over chunk embeddings

use std::cmp::Ordering;

use crate::errors::KbragError;
use crate::errors::Result;

/// Distance-queryable index mapping vectors to chunk ordinals
///
/// Built once over the whole corpus and immutable afterwards.
pub trait VectorIndex: Send + Sync {
    /// Up to `k` ordinals, nearest first
    fn search(&self, query: &[f32], k: usize) -> Vec<usize>;

    /// Number of indexed vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension every indexed vector shares
    fn dimension(&self) -> usize;
}

/// Constructs a [`VectorIndex`] from the full set of corpus vectors
pub trait IndexFactory: Send + Sync {
    /// `vectors[i]` belongs to the chunk with ordinal `i`
    fn build(&self, vectors: Vec<Vec<f32>>) -> Result<Box<dyn VectorIndex>>;
}

/// Exact nearest-neighbour search by squared Euclidean distance
///
/// Vectors are stored contiguously; every query scans the full set.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build an index over `vectors`
    ///
    /// # Errors
    /// - `IndexError` when the set is empty, a vector is empty, or dimensions differ
    pub fn new(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| KbragError::IndexError("Cannot index an empty vector set".to_string()))?;

        if dimension == 0 {
            return Err(KbragError::IndexError(
                "Cannot index zero-dimension vectors".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for (ordinal, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimension {
                return Err(KbragError::IndexError(format!(
                    "Vector {ordinal} has {} dimensions, expected {dimension}",
                    vector.len()
                )));
            }
            data.extend(vector);
        }

        Ok(Self { dimension, data })
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension)
    }
}

/// Squared L2 distance; callers guarantee equal lengths
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatL2Index {
    fn search(&self, query: &[f32], k: usize) -> Vec<usize> {
        if k == 0 || query.len() != self.dimension {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .rows()
            .enumerate()
            .map(|(ordinal, row)| (ordinal, squared_l2(query, row)))
            .collect();

        // Stable sort keeps ties in ordinal order; NaN distances sort last
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or_else(|| nan_last(a.1, b.1)));
        scored.truncate(k);
        scored.into_iter().map(|(ordinal, _)| ordinal).collect()
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn nan_last(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Default factory producing [`FlatL2Index`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatL2Factory;

impl IndexFactory for FlatL2Factory {
    fn build(&self, vectors: Vec<Vec<f32>>) -> Result<Box<dyn VectorIndex>> {
        Ok(Box::new(FlatL2Index::new(vectors)?))
    }
}
