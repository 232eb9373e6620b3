//! Pivot builder: sparse ratings to a dense item-by-user matrix.
//!
//! ## Algorithm
//! 1. Join every rating with its catalog entry (inner join on book id)
//! 2. Group the joined ratings by (title, user)
//! 3. Rows are the distinct titles in sorted order, columns the distinct
//!    user ids in ascending order
//! 4. A cell holds the mean rating of its group, or 0 when the user never
//!    rated that title
//!
//! The row order becomes the canonical [`ItemIndex`] that the reducer, the
//! similarity matrix and the recommender all take explicitly.

use crate::error::{EngineError, Result};
use data_loader::{DataIndex, UserId};
use nalgebra::DMatrix;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

/// Canonical ordered mapping between item titles and matrix rows
#[derive(Debug, Clone, PartialEq)]
pub struct ItemIndex {
    titles: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ItemIndex {
    /// Build an index from titles in row order; later duplicates are skipped
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self {
            titles: Vec::new(),
            positions: HashMap::new(),
        };
        for title in titles {
            let title = title.into();
            if index.positions.contains_key(&title) {
                continue;
            }
            index.positions.insert(title.clone(), index.titles.len());
            index.titles.push(title);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Row of a title (exact, case-sensitive match)
    pub fn position(&self, title: &str) -> Option<usize> {
        self.positions.get(title).copied()
    }

    /// Title stored at a row
    pub fn title(&self, row: usize) -> Option<&str> {
        self.titles.get(row).map(|t| t.as_str())
    }

    /// All titles in row order
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Case-insensitive substring search, in row order
    pub fn search(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.titles
            .iter()
            .filter(|t| t.to_lowercase().contains(&needle))
            .map(|t| t.as_str())
            .collect()
    }
}

/// What the join dropped or merged while building the pivot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PivotStats {
    /// Ratings that matched a titled catalog entry
    pub joined_ratings: usize,
    /// Ratings whose book id is missing from the catalog
    pub unknown_book_ratings: usize,
    /// Ratings of catalog entries with an empty title
    pub untitled_ratings: usize,
    /// Catalog entries that nobody rated
    pub unrated_books: usize,
    /// Cells that averaged more than one rating
    pub merged_cells: usize,
}

/// Dense item-by-user rating matrix plus the orders of its axes
#[derive(Debug, Clone)]
pub struct PivotMatrix {
    values: DMatrix<f64>,
    items: ItemIndex,
    users: Vec<UserId>,
    stats: PivotStats,
}

impl PivotMatrix {
    /// Build the pivot from the catalog and ratings held by `data_index`
    ///
    /// Fails with a configuration error when no rating survives the join.
    pub fn build(data_index: &DataIndex) -> Result<Self> {
        info!("Merging ratings with the catalog");
        let mut stats = PivotStats::default();

        // (title, user) -> (sum of ratings, number of ratings)
        let mut cells: BTreeMap<(&str, UserId), (f64, u32)> = BTreeMap::new();

        for book in data_index.books() {
            let ratings = data_index.get_book_ratings(book.id);
            if ratings.is_empty() {
                stats.unrated_books += 1;
                continue;
            }
            if !book.has_title() {
                stats.untitled_ratings += ratings.len();
                continue;
            }
            for rating in ratings {
                let cell = cells
                    .entry((book.title.as_str(), rating.user_id))
                    .or_insert((0.0, 0));
                cell.0 += f64::from(rating.rating);
                cell.1 += 1;
                stats.joined_ratings += 1;
            }
        }

        stats.unknown_book_ratings = data_index
            .unknown_book_ids()
            .iter()
            .map(|&id| data_index.get_book_ratings(id).len())
            .sum();

        if cells.is_empty() {
            return Err(EngineError::Configuration(
                "no rating matches a titled catalog entry".to_string(),
            ));
        }

        info!("Creating pivot table of book titles, users and ratings");
        let titles: BTreeSet<&str> = cells.keys().map(|&(title, _)| title).collect();
        let users: Vec<UserId> = cells
            .keys()
            .map(|&(_, user)| user)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(col, &user)| (user, col)).collect();
        let items = ItemIndex::from_titles(titles);

        let mut values = DMatrix::zeros(items.len(), users.len());
        for (&(title, user), &(sum, count)) in &cells {
            if count > 1 {
                stats.merged_cells += 1;
            }
            // Both lookups succeed: the axes were collected from these keys
            if let (Some(row), Some(&col)) = (items.position(title), columns.get(&user)) {
                values[(row, col)] = sum / f64::from(count);
            }
        }

        log_stats(&stats);
        info!(
            items = items.len(),
            users = users.len(),
            "Finished building pivot matrix"
        );

        Ok(Self {
            values,
            items,
            users,
            stats,
        })
    }

    /// Build a pivot directly from a matrix and its item order
    ///
    /// Used for tests and synthetic benchmarks; columns are numbered users
    /// starting at 1.
    pub fn from_matrix(values: DMatrix<f64>, items: ItemIndex) -> Result<Self> {
        if values.nrows() != items.len() {
            return Err(EngineError::Configuration(format!(
                "matrix has {} rows but the item index has {} titles",
                values.nrows(),
                items.len()
            )));
        }
        let users = (1..=values.ncols() as UserId).collect();
        Ok(Self {
            values,
            items,
            users,
            stats: PivotStats::default(),
        })
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn items(&self) -> &ItemIndex {
        &self.items
    }

    /// User ids in column order
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn stats(&self) -> &PivotStats {
        &self.stats
    }

    /// Rating stored for (title, user), `None` if either is unknown
    pub fn rating(&self, title: &str, user: UserId) -> Option<f64> {
        let row = self.items.position(title)?;
        let col = self.users.binary_search(&user).ok()?;
        Some(self.values[(row, col)])
    }

    /// Split into the pieces that outlive the build
    pub fn into_parts(self) -> (ItemIndex, Vec<UserId>, PivotStats) {
        (self.items, self.users, self.stats)
    }
}

fn log_stats(stats: &PivotStats) {
    if stats.unknown_book_ratings > 0 {
        warn!(
            ratings = stats.unknown_book_ratings,
            "Dropped ratings for books missing from the catalog"
        );
    }
    if stats.untitled_ratings > 0 {
        warn!(
            ratings = stats.untitled_ratings,
            "Dropped ratings for books without a title"
        );
    }
    if stats.unrated_books > 0 {
        warn!(
            books = stats.unrated_books,
            "Catalog entries without ratings are not indexed"
        );
    }
    if stats.merged_cells > 0 {
        warn!(
            cells = stats.merged_cells,
            "Averaged duplicate ratings for the same title and user"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Book, BookId, Rating};

    fn book(id: BookId, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            average_rating: 4.0,
            rating_count: 100,
            publication_year: Some(1990),
            authors: "Anon".to_string(),
            image_url: String::new(),
        }
    }

    fn rating(user_id: UserId, book_id: BookId, rating: u8) -> Rating {
        Rating {
            user_id,
            book_id,
            rating,
        }
    }

    #[test]
    fn test_item_index() {
        let index = ItemIndex::from_titles(["Emma", "Dune", "Emma"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.position("Dune"), Some(1));
        assert_eq!(index.title(0), Some("Emma"));
        assert_eq!(index.position("dune"), None);
        assert_eq!(index.search("DU"), vec!["Dune"]);
    }

    #[test]
    fn test_pivot_layout() {
        let index = DataIndex::from_parts(
            vec![book(1, "Zorba"), book(2, "Anna Karenina")],
            vec![rating(30, 1, 4), rating(10, 2, 5), rating(20, 1, 2)],
        );

        let pivot = PivotMatrix::build(&index).unwrap();

        // Titles sorted, users ascending
        assert_eq!(pivot.items().titles(), &["Anna Karenina", "Zorba"]);
        assert_eq!(pivot.users(), &[10, 20, 30]);
        assert_eq!(pivot.values().shape(), (2, 3));

        assert_eq!(pivot.rating("Zorba", 30), Some(4.0));
        assert_eq!(pivot.rating("Zorba", 20), Some(2.0));
        assert_eq!(pivot.rating("Anna Karenina", 10), Some(5.0));
        // Missing pairs are filled with 0
        assert_eq!(pivot.rating("Anna Karenina", 30), Some(0.0));
        assert_eq!(pivot.rating("Zorba", 99), None);
    }

    #[test]
    fn test_join_drops_and_counts() {
        let index = DataIndex::from_parts(
            vec![book(1, "Dune"), book(2, ""), book(3, "Unrated")],
            vec![
                rating(1, 1, 5),
                rating(1, 2, 3),
                rating(2, 99, 4),
                rating(2, 99, 2),
            ],
        );

        let pivot = PivotMatrix::build(&index).unwrap();

        assert_eq!(pivot.items().titles(), &["Dune"]);
        assert_eq!(pivot.users(), &[1]);
        assert_eq!(
            pivot.stats(),
            &PivotStats {
                joined_ratings: 1,
                unknown_book_ratings: 2,
                untitled_ratings: 1,
                unrated_books: 1,
                merged_cells: 0,
            }
        );
    }

    #[test]
    fn test_duplicates_are_averaged() {
        // Same user twice on one book, and two books sharing a title
        let index = DataIndex::from_parts(
            vec![book(1, "Dune"), book(2, "Dune"), book(3, "Emma")],
            vec![
                rating(1, 1, 5),
                rating(1, 1, 3),
                rating(2, 1, 2),
                rating(2, 2, 4),
                rating(3, 3, 1),
            ],
        );

        let pivot = PivotMatrix::build(&index).unwrap();

        assert_eq!(pivot.items().len(), 2);
        assert_eq!(pivot.rating("Dune", 1), Some(4.0));
        assert_eq!(pivot.rating("Dune", 2), Some(3.0));
        assert_eq!(pivot.stats().merged_cells, 2);
    }

    #[test]
    fn test_empty_join_is_configuration_error() {
        let index = DataIndex::from_parts(vec![book(1, "Dune")], vec![rating(1, 2, 5)]);
        assert!(matches!(
            PivotMatrix::build(&index),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_matrix_checks_rows() {
        let items = ItemIndex::from_titles(["a", "b"]);
        assert!(PivotMatrix::from_matrix(DMatrix::zeros(3, 4), items.clone()).is_err());

        let pivot = PivotMatrix::from_matrix(DMatrix::zeros(2, 4), items).unwrap();
        assert_eq!(pivot.users(), &[1, 2, 3, 4]);
    }
}
