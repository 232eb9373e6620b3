//! Similarity engine: Pearson correlation between item embeddings.
//!
//! Each embedding row is centered and scaled to unit length once; the
//! correlation of two rows is then the dot product of their standardized
//! forms. Only the upper triangle is computed (rows in parallel) and mirrored,
//! so `get(i, j) == get(j, i)` holds bit for bit.
//!
//! Conventions:
//! - the diagonal is exactly 1.0
//! - values are clamped to [-1, 1]
//! - a row with (numerically) zero variance correlates 0.0 with every other row

use crate::reduction::Embedding;
use rayon::prelude::*;
use tracing::info;

/// Rows whose centered norm falls below this fraction of the largest
/// embedding entry are treated as constant
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-10;

/// Dense, symmetric item-by-item correlation matrix (row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Correlate every pair of embedding rows
    pub fn from_embedding(embedding: &Embedding) -> Self {
        info!("Building similarity coefficient matrix");
        let matrix = embedding.values();
        let size = matrix.nrows();
        let scale = matrix.amax();

        let standardized: Vec<Option<Vec<f64>>> = (0..size)
            .into_par_iter()
            .map(|row| standardize(&embedding.row(row), scale))
            .collect();

        let upper: Vec<Vec<f64>> = (0..size)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..size)
                    .map(|j| pearson(&standardized[i], &standardized[j]))
                    .collect()
            })
            .collect();

        let mut values = vec![0.0; size * size];
        for (i, row) in upper.iter().enumerate() {
            values[i * size + i] = 1.0;
            for (offset, &coefficient) in row.iter().enumerate() {
                let j = i + 1 + offset;
                values[i * size + j] = coefficient;
                values[j * size + i] = coefficient;
            }
        }

        info!(items = size, "Finished calculating Pearson coefficients");
        Self { size, values }
    }

    /// Number of items (rows and columns)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Coefficient between rows `i` and `j`
    ///
    /// # Panics
    /// If either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.size && j < self.size, "similarity index out of bounds");
        self.values[i * self.size + j]
    }

    /// All coefficients of one item, in item index order
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }
}

/// Center a row and scale it to unit length; `None` if it is constant
fn standardize(row: &[f64], scale: f64) -> Option<Vec<f64>> {
    if row.is_empty() {
        return None;
    }
    let mean = row.iter().sum::<f64>() / row.len() as f64;
    let centered: Vec<f64> = row.iter().map(|v| v - mean).collect();
    let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();

    if !norm.is_finite() || norm <= scale * ZERO_VARIANCE_TOLERANCE {
        return None;
    }
    Some(centered.into_iter().map(|v| v / norm).collect())
}

fn pearson(a: &Option<Vec<f64>>, b: &Option<Vec<f64>>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => a
            .iter()
            .zip(b)
            .map(|(x, y)| x * y)
            .sum::<f64>()
            .clamp(-1.0, 1.0),
        _ => 0.0,
    }
}
