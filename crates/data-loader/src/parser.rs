//! Parser for the goodbooks-style CSV tables.
//!
//! - books.csv: `book_id, original_title, average_rating, ratings_count,
//!   original_publication_year, authors, image_url` (other columns ignored)
//! - ratings.csv: `user_id, book_id, rating`
//!
//! Headers are checked up front so a table missing a required column fails
//! with [`DataLoadError::MissingColumn`] instead of a per-record decode error.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns the catalog table must provide
pub const BOOK_COLUMNS: [&str; 7] = [
    "book_id",
    "original_title",
    "average_rating",
    "ratings_count",
    "original_publication_year",
    "authors",
    "image_url",
];

/// Columns the ratings table must provide
pub const RATING_COLUMNS: [&str; 3] = ["user_id", "book_id", "rating"];

/// Row of books.csv as it appears on disk
#[derive(Debug, Deserialize)]
struct BookRecord {
    book_id: BookId,
    original_title: Option<String>,
    average_rating: f32,
    ratings_count: u32,
    /// Stored as a float ("1997.0") and empty when unknown
    original_publication_year: Option<f64>,
    authors: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    user_id: UserId,
    book_id: BookId,
    rating: u8,
}

/// Open a file, mapping a missing path to `FileNotFound`
fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn csv_error(file: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(io) => DataLoadError::IoError(io),
        kind => DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: format!("{:?}", kind),
        },
    }
}

/// Build a CSV reader and verify its header carries every required column
fn reader_with_columns<R: Read>(
    input: R,
    file: &str,
    required: &[&str],
) -> Result<csv::Reader<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers().map_err(|e| csv_error(file, e))?;
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DataLoadError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(reader)
}

fn parse_year(raw: Option<f64>) -> Result<Option<i32>> {
    match raw {
        None => Ok(None),
        Some(year) if year.is_finite() && year.fract() == 0.0 => Ok(Some(year as i32)),
        Some(year) => Err(DataLoadError::InvalidValue {
            field: "original_publication_year".to_string(),
            value: year.to_string(),
        }),
    }
}

/// Parse the catalog table from any reader
///
/// `file` is only used to label errors.
pub fn parse_books<R: Read>(input: R, file: &str) -> Result<Vec<Book>> {
    let mut reader = reader_with_columns(input, file, &BOOK_COLUMNS)?;
    let mut books = Vec::new();

    for record in reader.deserialize::<BookRecord>() {
        let record = record.map_err(|e| csv_error(file, e))?;
        books.push(Book {
            id: record.book_id,
            title: record.original_title.unwrap_or_default(),
            average_rating: record.average_rating,
            rating_count: record.ratings_count,
            publication_year: parse_year(record.original_publication_year)?,
            authors: record.authors.unwrap_or_default(),
            image_url: record.image_url.unwrap_or_default(),
        });
    }

    Ok(books)
}

/// Parse the ratings table from any reader
pub fn parse_ratings<R: Read>(input: R, file: &str) -> Result<Vec<Rating>> {
    let mut reader = reader_with_columns(input, file, &RATING_COLUMNS)?;
    let mut ratings = Vec::new();

    for record in reader.deserialize::<RatingRecord>() {
        let record = record.map_err(|e| csv_error(file, e))?;
        ratings.push(Rating {
            user_id: record.user_id,
            book_id: record.book_id,
            rating: record.rating,
        });
    }

    Ok(ratings)
}

/// Parse books.csv from disk
pub fn parse_books_file(path: &Path) -> Result<Vec<Book>> {
    parse_books(open(path)?, &file_label(path))
}

/// Parse ratings.csv from disk
pub fn parse_ratings_file(path: &Path) -> Result<Vec<Rating>> {
    parse_ratings(open(path)?, &file_label(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS: &str = "\
book_id,goodreads_book_id,authors,original_publication_year,original_title,average_rating,ratings_count,image_url
1,2767052,Suzanne Collins,2008.0,The Hunger Games,4.34,4780653,https://images.example/1.jpg
2,3,\"J.K. Rowling, Mary GrandPré\",1997.0,Harry Potter and the Philosopher's Stone,4.44,4602479,https://images.example/2.jpg
3,41865,Homer,-750.0,,3.83,670812,https://images.example/3.jpg
4,11870085,John Green,,The Fault in Our Stars,4.26,2346404,
";

    #[test]
    fn test_parse_books() {
        let books = parse_books(BOOKS.as_bytes(), "books.csv").unwrap();
        assert_eq!(books.len(), 4);

        assert_eq!(books[0].title, "The Hunger Games");
        assert_eq!(books[0].publication_year, Some(2008));
        assert_eq!(books[0].rating_count, 4780653);

        // Quoted author list keeps its comma
        assert_eq!(books[1].authors, "J.K. Rowling, Mary GrandPré");

        // Missing title becomes empty, negative years survive
        assert!(!books[2].has_title());
        assert_eq!(books[2].publication_year, Some(-750));

        // Missing year and image
        assert_eq!(books[3].publication_year, None);
        assert_eq!(books[3].image_url, "");
    }

    #[test]
    fn test_parse_ratings() {
        let input = "user_id,book_id,rating\n1,258,5\n2,4081,4\n";
        let ratings = parse_ratings(input.as_bytes(), "ratings.csv").unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(
            ratings[1],
            Rating {
                user_id: 2,
                book_id: 4081,
                rating: 4
            }
        );
    }

    #[test]
    fn test_missing_column() {
        let input = "user_id,rating\n1,5\n";
        let err = parse_ratings(input.as_bytes(), "ratings.csv").unwrap_err();
        match err {
            DataLoadError::MissingColumn { file, column } => {
                assert_eq!(file, "ratings.csv");
                assert_eq!(column, "book_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_rating_reports_line() {
        let input = "user_id,book_id,rating\n1,258,5\n1,259,four\n";
        let err = parse_ratings(input.as_bytes(), "ratings.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_fractional_year_rejected() {
        assert!(parse_year(Some(1997.5)).is_err());
        assert_eq!(parse_year(Some(1997.0)).unwrap(), Some(1997));
        assert_eq!(parse_year(None).unwrap(), None);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_books_file(Path::new("no/such/dir/books.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
