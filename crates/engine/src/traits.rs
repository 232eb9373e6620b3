//! Core types and traits for the query-time filter pipeline.
//!
//! A query starts with every item of the similarity row as a [`Candidate`];
//! filters then narrow that set down to the recommendations.

/// One item considered for a query, identified by its item index row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub row: usize,
    /// Correlation with the queried item
    pub similarity: f64,
}

impl Candidate {
    pub fn new(row: usize, similarity: f64) -> Self {
        Self { row, similarity }
    }
}

/// What filters know about the query being answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryContext {
    /// Item index row of the queried title
    pub row: usize,
}

impl QueryContext {
    pub fn new(row: usize) -> Self {
        Self { row }
    }
}

/// Core trait for filtering candidates.
///
/// - `Send + Sync` lets one pipeline serve concurrent queries
/// - Filters take ownership of the candidates and return the survivors
pub trait CandidateFilter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    fn apply(&self, candidates: Vec<Candidate>, query: &QueryContext) -> Vec<Candidate>;
}
