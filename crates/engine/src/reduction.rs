//! Rank reducer: randomized truncated SVD of the pivot matrix.
//!
//! ## Algorithm
//! 1. Draw a Gaussian test matrix Ω (`users × (K + oversamples)`) from a
//!    ChaCha8 RNG seeded with `config.seed`
//! 2. Y = A·Ω, Q = orth(Y)
//! 3. Power iterations: Q = orth(A·orth(Aᵀ·Q))
//! 4. B = Qᵀ·A, exact SVD B = Û·Σ·Vᵀ, U = Q·Û
//! 5. Keep the K largest singular values; embedding = U_K·Σ_K
//!
//! Each kept column of U is sign-normalized so its largest-magnitude entry is
//! positive. Together with the fixed seed this makes the embedding a pure
//! function of the input matrix and the configuration.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pivot::PivotMatrix;
use nalgebra::{DMatrix, SVD};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Items projected onto K latent dimensions; row i is item index row i
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    values: DMatrix<f64>,
    singular_values: Vec<f64>,
}

impl Embedding {
    /// Reduce a pivot matrix to `config.latent_dimensions` columns
    pub fn fit(pivot: &PivotMatrix, config: &EngineConfig) -> Result<Self> {
        Self::fit_matrix(pivot.values(), config)
    }

    /// Reduce any `items × users` matrix
    ///
    /// K must satisfy `1 <= K <= min(items, users) - 1`; anything else is a
    /// configuration error rather than a silent truncation.
    pub fn fit_matrix(matrix: &DMatrix<f64>, config: &EngineConfig) -> Result<Self> {
        let (n_items, n_users) = matrix.shape();
        let k = config.latent_dimensions;
        let max_k = n_items.min(n_users).saturating_sub(1);

        if k == 0 || k > max_k {
            return Err(EngineError::Configuration(format!(
                "{} latent dimensions requested but a {}x{} matrix supports at most {}",
                k, n_items, n_users, max_k
            )));
        }

        info!(
            components = k,
            seed = config.seed,
            "Beginning truncated SVD of {}x{} matrix",
            n_items,
            n_users
        );

        let sketch = (k + config.oversamples).min(n_users);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let omega = DMatrix::<f64>::from_fn(n_users, sketch, |_, _| StandardNormal.sample(&mut rng));

        let mut q = orthonormal_basis(matrix * &omega);
        for iteration in 0..config.power_iterations {
            let z = orthonormal_basis(matrix.tr_mul(&q));
            q = orthonormal_basis(matrix * &z);
            debug!(iteration, "Power iteration complete");
        }

        let projected = q.tr_mul(matrix);
        let svd = SVD::new(projected, true, false);
        let u_small = svd
            .u
            .ok_or_else(|| EngineError::Decomposition("SVD did not compute U".to_string()))?;
        let u = &q * u_small;
        let sigma = svd.singular_values;

        // Component order: descending singular value, ties by position
        let mut order: Vec<usize> = (0..sigma.len()).collect();
        order.sort_by(|&a, &b| {
            sigma[b]
                .partial_cmp(&sigma[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        if order.len() < k {
            return Err(EngineError::Decomposition(format!(
                "only {} components available, {} requested",
                order.len(),
                k
            )));
        }

        let mut values = DMatrix::zeros(n_items, k);
        let mut singular_values = Vec::with_capacity(k);
        for (dim, &component) in order.iter().take(k).enumerate() {
            let column = u.column(component);
            let sign = if column[column.iamax()] < 0.0 { -1.0 } else { 1.0 };
            let scale = sign * sigma[component];
            for row in 0..n_items {
                values[(row, dim)] = column[row] * scale;
            }
            singular_values.push(sigma[component]);
        }

        info!("Generated SVD embedding");
        Ok(Self {
            values,
            singular_values,
        })
    }

    /// `items × K` embedding matrix
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Number of latent dimensions K
    pub fn dimensions(&self) -> usize {
        self.values.ncols()
    }

    /// Kept singular values, largest first
    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Coordinates of one item
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.row(row).iter().copied().collect()
    }
}

/// Orthonormal basis of the column space via thin QR
fn orthonormal_basis(matrix: DMatrix<f64>) -> DMatrix<f64> {
    matrix.qr().q()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(k: usize) -> EngineConfig {
        EngineConfig::new().with_latent_dimensions(k)
    }

    /// Rank-2 matrix: rows are combinations of two user profiles
    fn low_rank_matrix() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            5,
            6,
            &[
                5.0, 4.0, 0.0, 0.0, 1.0, 0.0, //
                4.0, 3.2, 0.0, 0.0, 0.8, 0.0, //
                0.0, 0.0, 3.0, 5.0, 0.0, 2.0, //
                0.0, 0.0, 1.5, 2.5, 0.0, 1.0, //
                5.0, 4.0, 3.0, 5.0, 1.0, 2.0, //
            ],
        )
    }

    #[test]
    fn test_shape_and_ordering() {
        let embedding = Embedding::fit_matrix(&low_rank_matrix(), &config(3)).unwrap();

        assert_eq!(embedding.len(), 5);
        assert_eq!(embedding.dimensions(), 3);

        let s = embedding.singular_values();
        assert!(s[0] >= s[1] && s[1] >= s[2]);
        // Rank 2: the third component carries nothing
        assert!(s[2] < 1e-8);
    }

    #[test]
    fn test_matches_exact_singular_values() {
        let matrix = low_rank_matrix();
        let exact = SVD::new(matrix.clone(), false, false).singular_values;
        let mut exact: Vec<f64> = exact.iter().copied().collect();
        exact.sort_by(|a, b| b.partial_cmp(a).unwrap());

        let embedding = Embedding::fit_matrix(&matrix, &config(2)).unwrap();
        for (approx, exact) in embedding.singular_values().iter().zip(&exact) {
            assert!((approx - exact).abs() < 1e-8);
        }
    }

    #[test]
    fn test_preserves_row_geometry() {
        // With K >= rank, embedding rows keep the pivot rows' inner products
        let matrix = low_rank_matrix();
        let embedding = Embedding::fit_matrix(&matrix, &config(2)).unwrap();
        let gram = embedding.values() * embedding.values().transpose();
        let expected = &matrix * matrix.transpose();

        for i in 0..5 {
            for j in 0..5 {
                assert!((gram[(i, j)] - expected[(i, j)]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_sign_convention() {
        let embedding = Embedding::fit_matrix(&low_rank_matrix(), &config(2)).unwrap();
        for dim in 0..2 {
            let column = embedding.values().column(dim);
            assert!(column[column.iamax()] > 0.0);
        }
    }

    #[test]
    fn test_deterministic() {
        let matrix = low_rank_matrix();
        let a = Embedding::fit_matrix(&matrix, &config(3)).unwrap();
        let b = Embedding::fit_matrix(&matrix, &config(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_dimensions() {
        let matrix = low_rank_matrix();
        // min(5, 6) - 1 = 4
        assert!(Embedding::fit_matrix(&matrix, &config(4)).is_ok());
        assert!(matches!(
            Embedding::fit_matrix(&matrix, &config(5)),
            Err(EngineError::Configuration(_))
        ));
        assert!(matches!(
            Embedding::fit_matrix(&matrix, &config(0)),
            Err(EngineError::Configuration(_))
        ));
    }
}
