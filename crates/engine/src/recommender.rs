//! # Recommendation Engine
//!
//! Owns everything the build produces and answers queries against it:
//! 1. Pivot the joined ratings (canonical item index)
//! 2. Reduce the pivot to K latent dimensions
//! 3. Correlate the embeddings
//! 4. Per query: look up the title, filter its similarity row, join the
//!    catalog
//!
//! The engine is immutable after [`RecommendationEngine::build`]; share it
//! with `Arc` and query it from any number of threads.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{ExcludeQueryFilter, SimilarityBandFilter};
use crate::pivot::{ItemIndex, PivotMatrix, PivotStats};
use crate::reduction::Embedding;
use crate::similarity::SimilarityMatrix;
use crate::traits::{Candidate, QueryContext};
use data_loader::{Book, BookId, DataIndex};

/// Catalog metadata of one recommended book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecommendation {
    pub book_id: BookId,
    pub title: String,
    pub average_rating: f32,
    pub rating_count: u32,
    pub publication_year: Option<i32>,
    pub authors: String,
    pub image_url: String,
    /// Correlation with the queried title
    pub similarity: f64,
}

impl BookRecommendation {
    fn from_book(book: &Book, similarity: f64) -> Self {
        Self {
            book_id: book.id,
            title: book.title.clone(),
            average_rating: book.average_rating,
            rating_count: book.rating_count,
            publication_year: book.publication_year,
            authors: book.authors.clone(),
            image_url: book.image_url.clone(),
            similarity,
        }
    }
}

/// Summary of a build, for logs and the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub pivot: PivotStats,
    pub items: usize,
    pub users: usize,
    pub latent_dimensions: usize,
    pub singular_values: Vec<f64>,
    pub elapsed: Duration,
}

/// Item-item recommender built once from the full dataset
#[derive(Debug)]
pub struct RecommendationEngine {
    data_index: Arc<DataIndex>,
    config: EngineConfig,
    items: ItemIndex,
    embedding: Embedding,
    similarity: SimilarityMatrix,
    filters: FilterPipeline,
    report: BuildReport,
}

impl RecommendationEngine {
    /// Build the engine from the catalog and ratings held by `data_index`
    ///
    /// Errors are configuration problems (bad K, empty join, empty band) and
    /// should abort startup.
    pub fn build(data_index: Arc<DataIndex>, config: EngineConfig) -> Result<Self> {
        let start = Instant::now();
        info!("Building recommendation engine");
        config.validate()?;

        let pivot = PivotMatrix::build(&data_index)?;
        let embedding = Embedding::fit(&pivot, &config)?;
        let similarity = SimilarityMatrix::from_embedding(&embedding);

        let users = pivot.users().len();
        let (items, _, pivot_stats) = pivot.into_parts();

        let filters = FilterPipeline::new()
            .add_filter(ExcludeQueryFilter)
            .add_filter(SimilarityBandFilter::new(config.band));

        let report = BuildReport {
            pivot: pivot_stats,
            items: items.len(),
            users,
            latent_dimensions: embedding.dimensions(),
            singular_values: embedding.singular_values().to_vec(),
            elapsed: start.elapsed(),
        };
        info!(
            items = report.items,
            users = report.users,
            "Finished building the recommendation engine in {:.2?}",
            report.elapsed
        );

        Ok(Self {
            data_index,
            config,
            items,
            embedding,
            similarity,
            filters,
            report,
        })
    }

    /// Books similar to `title`, most similar first
    ///
    /// `title` must match an indexed title exactly. Every catalog entry
    /// carrying a selected title is returned; there is no count cap.
    #[instrument(skip(self))]
    pub fn recommend(&self, title: &str) -> Result<Vec<BookRecommendation>> {
        let row = self.row_of(title)?;

        let candidates: Vec<Candidate> = self
            .similarity
            .row(row)
            .iter()
            .enumerate()
            .map(|(other, &coefficient)| Candidate::new(other, coefficient))
            .collect();

        let mut selected = self.filters.apply(candidates, &QueryContext::new(row));
        selected.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then(a.row.cmp(&b.row))
        });

        let mut recommendations = Vec::with_capacity(selected.len());
        for candidate in selected {
            let Some(similar_title) = self.items.title(candidate.row) else {
                continue;
            };
            for &book_id in self.data_index.books_by_title(similar_title) {
                if let Some(book) = self.data_index.get_book(book_id) {
                    recommendations.push(BookRecommendation::from_book(book, candidate.similarity));
                }
            }
        }

        debug!("Found {} recommendations", recommendations.len());
        Ok(recommendations)
    }

    /// Correlation between two indexed titles
    pub fn similarity_between(&self, first: &str, second: &str) -> Result<f64> {
        let i = self.row_of(first)?;
        let j = self.row_of(second)?;
        Ok(self.similarity.get(i, j))
    }

    /// Indexed titles containing `query`, case-insensitive
    pub fn search_titles(&self, query: &str) -> Vec<&str> {
        self.items.search(query)
    }

    pub fn items(&self) -> &ItemIndex {
        &self.items
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    pub fn similarity_matrix(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    fn row_of(&self, title: &str) -> Result<usize> {
        self.items
            .position(title)
            .ok_or_else(|| EngineError::NotFound {
                title: title.to_string(),
            })
    }
}
