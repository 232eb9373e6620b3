use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::DataIndex;
use engine::{BookRecommendation, EngineConfig, EngineError, RecommendationEngine};
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// BookRecs - item-item book recommendation engine
#[derive(Parser)]
#[command(name = "book-recs")]
#[command(about = "Book recommendations from rating correlations", long_about = None)]
struct Cli {
    /// Directory holding books.csv and ratings.csv
    #[arg(short, long, default_value = "dataset")]
    data_dir: PathBuf,

    /// JSON file with engine settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of latent dimensions kept by the SVD
    #[arg(long)]
    components: Option<usize>,

    /// Seed for the randomized SVD
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend books similar to a title
    Recommend {
        /// Exact title of the book (case-sensitive)
        #[arg(long)]
        title: String,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search indexed titles
    Search {
        /// Case-insensitive substring to look for
        #[arg(long)]
        query: String,

        /// Maximum number of titles to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show dataset and engine statistics
    Stats,

    /// Run concurrent queries against one engine
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(&cli.data_dir)
            .with_context(|| format!("Failed to load dataset from {}", cli.data_dir.display()))?,
    );
    let engine = Arc::new(
        RecommendationEngine::build(data_index, config)
            .context("Failed to build the recommendation engine")?,
    );
    println!("{} Engine ready in {:.2?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Recommend { title, json } => handle_recommend(&engine, &title, json)?,
        Commands::Search { query, limit } => handle_search(&engine, &query, limit),
        Commands::Stats => handle_stats(&engine),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(engine, requests, concurrent).await?,
    }

    Ok(())
}

/// Defaults, then the config file, then command-line flags
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(components) = cli.components {
        config = config.with_latent_dimensions(components);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    config.validate().context("Invalid engine configuration")?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<EngineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Handle the 'recommend' command
fn handle_recommend(engine: &RecommendationEngine, title: &str, json: bool) -> Result<()> {
    let recommendations = match engine.recommend(title) {
        Ok(recs) => recs,
        Err(EngineError::NotFound { title }) => {
            let suggestions = engine.search_titles(&title);
            if !suggestions.is_empty() {
                println!("{}", "Did you mean:".yellow());
                for suggestion in suggestions.iter().take(5) {
                    println!("  - {}", suggestion);
                }
            }
            bail!("'{}' is not in the item index", title);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        print_recommendations(title, &recommendations);
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(engine: &RecommendationEngine, query: &str, limit: usize) {
    let matches = engine.search_titles(query);

    println!("{}", format!("Search results for '{}':", query).bold().blue());
    for title in matches.iter().take(limit) {
        println!("  - {}", title);
    }
    if matches.len() > limit {
        println!("  ... and {} more", matches.len() - limit);
    }
}

/// Handle the 'stats' command
fn handle_stats(engine: &RecommendationEngine) {
    let (users, books, ratings) = engine.data_index().counts();
    let report = engine.report();

    println!("{}", "Dataset".bold().blue());
    println!("{}Books in catalog: {}", "• ".green(), books);
    println!("{}Users: {}", "• ".green(), users);
    println!("{}Ratings: {}", "• ".green(), ratings);
    println!(
        "{}Duplicate titles: {}",
        "• ".green(),
        engine.data_index().duplicate_titles().len()
    );

    println!("{}", "Engine".bold().blue());
    println!("{}Indexed titles: {}", "• ".cyan(), report.items);
    println!("{}Pivot users: {}", "• ".cyan(), report.users);
    println!("{}Latent dimensions: {}", "• ".cyan(), report.latent_dimensions);
    println!(
        "{}Similarity band: ({}, {})",
        "• ".cyan(),
        engine.config().band.lower,
        engine.config().band.upper
    );
    println!("{}Build time: {:.2?}", "• ".cyan(), report.elapsed);

    println!("{}", "Data integrity".bold().blue());
    println!("{}Joined ratings: {}", "• ".yellow(), report.pivot.joined_ratings);
    println!(
        "{}Ratings for unknown books: {}",
        "• ".yellow(),
        report.pivot.unknown_book_ratings
    );
    println!(
        "{}Ratings for untitled books: {}",
        "• ".yellow(),
        report.pivot.untitled_ratings
    );
    println!("{}Unrated books: {}", "• ".yellow(), report.pivot.unrated_books);
    println!("{}Averaged cells: {}", "• ".yellow(), report.pivot.merged_cells);
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: Arc<RecommendationEngine>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if engine.items().is_empty() || requests == 0 {
        bail!("Nothing to benchmark");
    }

    // Random indexed titles
    let mut rng = rand::rng();
    let titles: Vec<String> = (0..requests)
        .filter_map(|_| engine.items().titles().choose(&mut rng).cloned())
        .collect();

    info!(requests, concurrent, "Starting benchmark");
    let wall = Instant::now();
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);

    for batch in titles.chunks(concurrent.max(1)) {
        let mut handles = Vec::with_capacity(batch.len());
        for title in batch {
            let engine = Arc::clone(&engine);
            let title = title.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                engine.recommend(&title)?;
                Ok::<_, EngineError>(start.elapsed())
            }));
        }
        for handle in handles {
            timings.push(handle.await??);
        }
    }
    let wall = wall.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / wall.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(title: &str, recommendations: &[BookRecommendation]) {
    println!("{}", format!("Books similar to '{}':", title).bold().blue());
    if recommendations.is_empty() {
        println!("  (no books in the similarity band)");
        return;
    }

    for (rank, rec) in recommendations.iter().enumerate() {
        let year = rec
            .publication_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        println!(
            "{}. {} ({}) by {} - avg {:.2} from {} ratings - similarity {:.3}",
            (rank + 1).to_string().green(),
            rec.title,
            year,
            rec.authors,
            rec.average_rating,
            rec.rating_count,
            rec.similarity
        );
        if !rec.image_url.is_empty() {
            println!("   {}", rec.image_url.dimmed());
        }
    }
}
