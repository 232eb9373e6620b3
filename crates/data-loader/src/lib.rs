//! # Data Loader Crate
//!
//! Loads the book catalog and the ratings table that feed the recommendation
//! engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Book, Rating, DataIndex)
//! - **parser**: Parse CSV tables into Rust structs
//! - **index**: Load, validate and report on the DataIndex
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("dataset"))?;
//!
//! for id in index.books_by_title("The Hunger Games") {
//!     println!("{:?}", index.get_book(*id));
//! }
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::RATING_RANGE;
pub use types::{
    // Type aliases
    UserId,
    BookId,
    // Core types
    Book,
    Rating,
    DataIndex,
};
