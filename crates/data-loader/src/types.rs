//! Core domain types for the book catalog and ratings tables.
//!
//! - Type aliases keep user IDs and book IDs apart at the call site
//! - `Book` is one catalog entry, `Rating` one observation
//! - `DataIndex` owns both tables and the lookups built over them

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a book (the catalog's `book_id` column)
pub type BookId = u32;

// =============================================================================
// Catalog
// =============================================================================

/// One entry of the book catalog.
///
/// `title` is the key users query by; it is expected to be unique across the
/// catalog, but duplicates are tolerated (see [`DataIndex::duplicate_titles`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub average_rating: f32,
    /// Number of ratings the catalog reports for this book
    pub rating_count: u32,
    /// Original publication year; negative for BCE, `None` when unknown
    pub publication_year: Option<i32>,
    /// Comma-separated author list as published in the catalog
    pub authors: String,
    pub image_url: String,
}

impl Book {
    /// Books without a title can never be looked up
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

// =============================================================================
// Rating Type
// =============================================================================

/// A single rating from a user for a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub book_id: BookId,
    /// Rating value from 1 to 5
    pub rating: u8,
}

// =============================================================================
// DataIndex - the in-memory rating store
// =============================================================================

/// Holds the catalog and every rating, with lookups by user, book and title.
///
/// Built once at startup and never modified afterwards; the engine shares it
/// behind an `Arc`.
#[derive(Debug)]
pub struct DataIndex {
    /// Catalog ordered by id so iteration is deterministic
    pub(crate) books: BTreeMap<BookId, Book>,

    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each book, in insertion order
    pub(crate) book_ratings: HashMap<BookId, Vec<Rating>>,

    /// Book ids sharing each title, ascending
    pub(crate) title_index: HashMap<String, Vec<BookId>>,

    pub(crate) rating_count: usize,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            books: BTreeMap::new(),
            user_ratings: HashMap::new(),
            book_ratings: HashMap::new(),
            title_index: HashMap::new(),
            rating_count: 0,
        }
    }

    /// Get a book by ID
    pub fn get_book(&self, id: BookId) -> Option<&Book> {
        self.books.get(&id)
    }

    /// Iterate over the catalog in ascending id order
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    /// Get all ratings made by a user
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for a book
    pub fn get_book_ratings(&self, book_id: BookId) -> &[Rating] {
        self.book_ratings
            .get(&book_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every book id carrying exactly this title (case-sensitive)
    pub fn books_by_title(&self, title: &str) -> &[BookId] {
        self.title_index
            .get(title)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of rated books that are missing from the catalog
    pub fn unknown_book_ids(&self) -> Vec<BookId> {
        let mut ids: Vec<BookId> = self
            .book_ratings
            .keys()
            .copied()
            .filter(|id| !self.books.contains_key(id))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Titles shared by more than one catalog entry, sorted by title
    pub fn duplicate_titles(&self) -> Vec<(&str, usize)> {
        let mut dups: Vec<(&str, usize)> = self
            .title_index
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(title, ids)| (title.as_str(), ids.len()))
            .collect();
        dups.sort_unstable();
        dups
    }

    /// Insert a book into the catalog, replacing any entry with the same id
    pub fn insert_book(&mut self, book: Book) {
        if let Some(previous) = self.books.remove(&book.id) {
            self.remove_title(&previous.title, previous.id);
        }

        if book.has_title() {
            let ids = self.title_index.entry(book.title.clone()).or_default();
            if let Err(pos) = ids.binary_search(&book.id) {
                ids.insert(pos, book.id);
            }
        }
        self.books.insert(book.id, book);
    }

    /// Insert a rating and update indices
    pub fn insert_rating(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);

        self.book_ratings
            .entry(rating.book_id)
            .or_default()
            .push(rating);

        self.rating_count += 1;
    }

    /// (users, books, ratings) counts for logging and validation
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.user_ratings.len(), self.books.len(), self.rating_count)
    }

    fn remove_title(&mut self, title: &str, id: BookId) {
        if let Some(ids) = self.title_index.get_mut(title) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.title_index.remove(title);
            }
        }
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
