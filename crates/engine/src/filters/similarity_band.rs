//! Filter keeping candidates whose coefficient lies inside the similarity band.

use crate::config::SimilarityBand;
use crate::traits::{Candidate, CandidateFilter, QueryContext};

/// Keeps candidates with `lower < similarity < upper`
pub struct SimilarityBandFilter {
    band: SimilarityBand,
}

impl SimilarityBandFilter {
    pub fn new(band: SimilarityBand) -> Self {
        Self { band }
    }
}

impl CandidateFilter for SimilarityBandFilter {
    fn name(&self) -> &str {
        "SimilarityBandFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _query: &QueryContext) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|candidate| self.band.contains(candidate.similarity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band() {
        let candidates = vec![
            Candidate::new(0, 1.0),
            Candidate::new(1, 0.99),
            Candidate::new(2, 0.75),
            Candidate::new(3, 0.7501),
            Candidate::new(4, -0.95),
            Candidate::new(5, f64::NAN),
        ];

        let filter = SimilarityBandFilter::new(SimilarityBand::default());
        let filtered = filter.apply(candidates, &QueryContext::new(0));

        let rows: Vec<usize> = filtered.iter().map(|c| c.row).collect();
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn test_custom_band() {
        let candidates = vec![Candidate::new(0, 0.2), Candidate::new(1, 0.6)];

        let filter = SimilarityBandFilter::new(SimilarityBand::new(0.5, 0.7));
        let filtered = filter.apply(candidates, &QueryContext::new(9));

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].row, 1);
    }
}
