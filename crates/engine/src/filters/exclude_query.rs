//! Filter that removes the queried item from its own recommendations.
//!
//! The similarity band already rejects a coefficient of exactly 1.0, but this
//! filter makes self-exclusion independent of floating-point rounding.

use crate::traits::{Candidate, CandidateFilter, QueryContext};

pub struct ExcludeQueryFilter;

impl CandidateFilter for ExcludeQueryFilter {
    fn name(&self) -> &str {
        "ExcludeQueryFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, query: &QueryContext) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|candidate| candidate.row != query.row)
            .collect()
    }
}
