//! # Engine Crate
//!
//! Item-item book recommendations from a sparse rating matrix.
//!
//! ## Components
//!
//! - **pivot**: dense item-by-user matrix and the canonical item index
//! - **reduction**: seeded randomized truncated SVD to K latent dimensions
//! - **similarity**: Pearson correlation between item embeddings
//! - **filters** / **filter_pipeline**: query-time candidate filtering
//! - **recommender**: the engine object tying the stages together
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use engine::{EngineConfig, RecommendationEngine};
//! use std::sync::Arc;
//!
//! let data_index = Arc::new(DataIndex::load_from_files("dataset".as_ref())?);
//! let engine = RecommendationEngine::build(data_index, EngineConfig::default())?;
//!
//! for rec in engine.recommend("The Hobbit")? {
//!     println!("{} ({:.3})", rec.title, rec.similarity);
//! }
//! ```

pub mod config;
pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod pivot;
pub mod recommender;
pub mod reduction;
pub mod similarity;
pub mod traits;

// Re-export main types
pub use config::{EngineConfig, SimilarityBand};
pub use error::{EngineError, Result};
pub use filter_pipeline::FilterPipeline;
pub use pivot::{ItemIndex, PivotMatrix, PivotStats};
pub use recommender::{BookRecommendation, BuildReport, RecommendationEngine};
pub use reduction::Embedding;
pub use similarity::SimilarityMatrix;
pub use traits::{Candidate, CandidateFilter, QueryContext};
