//! The FilterPipeline chains candidate filters.

use crate::traits::{Candidate, CandidateFilter, QueryContext};

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(ExcludeQueryFilter)
///     .add_filter(SimilarityBandFilter::new(SimilarityBand::default()));
///
/// let selected = pipeline.apply(candidates, &QueryContext::new(row));
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn CandidateFilter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl CandidateFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the filters, in application order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence to the candidates.
    pub fn apply(&self, candidates: Vec<Candidate>, query: &QueryContext) -> Vec<Candidate> {
        let mut current = candidates;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current, query);
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        current
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.filter_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimilarityBand;
    use crate::filters::{ExcludeQueryFilter, SimilarityBandFilter};

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(0, 1.0),
            Candidate::new(1, 0.9),
            Candidate::new(2, 0.1),
        ]
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let filtered = pipeline.apply(candidates(), &QueryContext::new(0));
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_chained_filters() {
        let pipeline = FilterPipeline::new()
            .add_filter(ExcludeQueryFilter)
            .add_filter(SimilarityBandFilter::new(SimilarityBand::default()));

        assert_eq!(
            pipeline.filter_names(),
            vec!["ExcludeQueryFilter", "SimilarityBandFilter"]
        );

        let filtered = pipeline.apply(candidates(), &QueryContext::new(0));
        assert_eq!(filtered, vec![Candidate::new(1, 0.9)]);
    }
}
