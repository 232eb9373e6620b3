//! Filter implementations for the candidate pipeline.

pub mod exclude_query;
pub mod similarity_band;

// Re-export for convenience
pub use exclude_query::ExcludeQueryFilter;
pub use similarity_band::SimilarityBandFilter;
