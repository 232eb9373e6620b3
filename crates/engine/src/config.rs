//! Engine configuration.
//!
//! Defaults reproduce the reference recommender: 20 latent dimensions, seed 17
//! and the open similarity band (0.75, 1.0).

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Open interval of correlation coefficients that count as "similar"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBand {
    /// Exclusive lower bound
    pub lower: f64,
    /// Exclusive upper bound
    pub upper: f64,
}

impl SimilarityBand {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// True when `lower < coefficient < upper`
    pub fn contains(&self, coefficient: f64) -> bool {
        coefficient > self.lower && coefficient < self.upper
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower >= self.upper {
            return Err(EngineError::Configuration(format!(
                "similarity band ({}, {}) is empty or not finite",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

impl Default for SimilarityBand {
    fn default() -> Self {
        Self::new(0.75, 1.0)
    }
}

/// Parameters of the offline build
///
/// Missing fields fall back to their defaults when deserialized, so a config
/// file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of latent dimensions K kept by the truncated SVD
    pub latent_dimensions: usize,
    /// Seed of the random test matrix
    pub seed: u64,
    /// Extra random columns sampled beyond K
    pub oversamples: usize,
    /// Power iterations used to sharpen the sampled range
    pub power_iterations: usize,
    pub band: SimilarityBand,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            latent_dimensions: 20,
            seed: 17,
            oversamples: 10,
            power_iterations: 5,
            band: SimilarityBand::default(),
        }
    }

    /// Configure the number of latent dimensions (default: 20)
    pub fn with_latent_dimensions(mut self, k: usize) -> Self {
        self.latent_dimensions = k;
        self
    }

    /// Configure the RNG seed (default: 17)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Configure the oversampling (default: 10)
    pub fn with_oversamples(mut self, oversamples: usize) -> Self {
        self.oversamples = oversamples;
        self
    }

    /// Configure the number of power iterations (default: 5)
    pub fn with_power_iterations(mut self, iterations: usize) -> Self {
        self.power_iterations = iterations;
        self
    }

    /// Configure the similarity band (default: (0.75, 1.0))
    pub fn with_band(mut self, band: SimilarityBand) -> Self {
        self.band = band;
        self
    }

    /// Checks that do not depend on the data
    pub fn validate(&self) -> Result<()> {
        if self.latent_dimensions == 0 {
            return Err(EngineError::Configuration(
                "latent_dimensions must be at least 1".to_string(),
            ));
        }
        self.band.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.latent_dimensions, 20);
        assert_eq!(config.seed, 17);
        assert_eq!(config.band, SimilarityBand::new(0.75, 1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_band_is_open() {
        let band = SimilarityBand::default();
        assert!(band.contains(0.9));
        assert!(!band.contains(0.75));
        assert!(!band.contains(1.0));
        assert!(!band.contains(-0.9));
    }

    #[test]
    fn test_invalid_config() {
        let zero_k = EngineConfig::new().with_latent_dimensions(0);
        assert!(matches!(zero_k.validate(), Err(EngineError::Configuration(_))));

        let empty_band = EngineConfig::new().with_band(SimilarityBand::new(0.9, 0.5));
        assert!(matches!(empty_band.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "latent_dimensions": 8 }"#).unwrap();
        assert_eq!(config.latent_dimensions, 8);
        assert_eq!(config.seed, 17);
        assert_eq!(config.power_iterations, 5);
    }
}
