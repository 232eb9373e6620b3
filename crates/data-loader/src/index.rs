//! DataIndex loading and validation.
//!
//! - Parse books.csv and ratings.csv in parallel
//! - Populate the catalog and rating indices
//! - Validate rating values and report data-integrity issues

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{info, warn};

/// Lowest and highest rating value the ratings table may contain
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

impl DataIndex {
    /// Load the catalog and ratings from a directory holding
    /// `books.csv` and `ratings.csv`
    ///
    /// Steps:
    /// 1. Parse both files in parallel
    /// 2. Build the catalog and rating indices
    /// 3. Validate rating values
    /// 4. Log data-integrity warnings (never fatal)
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Reading data from {}", data_dir.display());

        let books_path = data_dir.join("books.csv");
        let ratings_path = data_dir.join("ratings.csv");

        let (books, ratings) = rayon::join(
            || parser::parse_books_file(&books_path),
            || parser::parse_ratings_file(&ratings_path),
        );
        let books = books?;
        let ratings = ratings?;

        info!(
            "Finished reading {} books and {} ratings",
            books.len(),
            ratings.len()
        );

        let index = Self::from_parts(books, ratings);
        index.validate()?;
        index.log_integrity_warnings();

        let (users, books, ratings) = index.counts();
        info!(users, books, ratings, "DataIndex built and validated");
        Ok(index)
    }

    /// Build an index from already-parsed tables
    pub fn from_parts(books: Vec<Book>, ratings: Vec<Rating>) -> Self {
        let mut index = DataIndex::new();
        for book in books {
            index.insert_book(book);
        }
        for rating in ratings {
            index.insert_rating(rating);
        }
        index
    }

    /// Validate data integrity
    ///
    /// Only rating values are checked. Ratings pointing at books missing
    /// from the catalog are legal here; the engine's join drops them.
    pub fn validate(&self) -> Result<()> {
        for ratings in self.user_ratings.values() {
            for rating in ratings {
                if !RATING_RANGE.contains(&rating.rating) {
                    return Err(DataLoadError::InvalidValue {
                        field: "rating".to_string(),
                        value: rating.rating.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Warn about catalog and rating issues that are tolerated
    pub fn log_integrity_warnings(&self) {
        let duplicates = self.duplicate_titles();
        if !duplicates.is_empty() {
            warn!(
                titles = duplicates.len(),
                "Catalog contains duplicate titles; their ratings will share one row"
            );
            for (title, count) in duplicates.iter().take(10) {
                warn!("  '{}' appears {} times", title, count);
            }
        }

        let untitled = self.books().filter(|b| !b.has_title()).count();
        if untitled > 0 {
            warn!(books = untitled, "Catalog entries without a title cannot be recommended");
        }

        let unknown = self.unknown_book_ids();
        if !unknown.is_empty() {
            warn!(
                books = unknown.len(),
                "Ratings reference book ids missing from the catalog"
            );
        }
    }
}
