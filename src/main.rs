//! culture-scraper - Culture Circle fashion catalog scraper
//!
//! Browser-driven listing scraper with image downloads and CLIP similarity search.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use culture_scraper::commands::{ImagesCommand, ScrapeCommand, SimilarCommand, SimilarQuery};
use culture_scraper::config::{Config, OutputFormat};
use culture_scraper::dataset::run_timestamp;
use culture_scraper::embedding::ImageEmbedder;
use culture_scraper::filters::FilterChainBuilder;
use culture_scraper::format::Formatter;
use culture_scraper::logging;
use culture_scraper::site::browser::Browser;
use culture_scraper::site::catalog::{Category, Gender, SectionSelection};
use culture_scraper::site::models::PriceTier;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "culture-scraper",
    version,
    about = "Culture Circle fashion catalog scraper",
    long_about = "Scrapes Culture Circle listings through a real browser, downloads product images, \
                  writes CSV/JSON datasets and finds visually similar products."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory that receives run directories
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Output format (table, json, markdown)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the catalog into a new run directory
    #[command(alias = "s")]
    Scrape {
        /// Browser to automate (chrome, edge, firefox)
        #[arg(long)]
        browser: Option<Browser>,

        /// WebDriver executable to spawn
        #[arg(long)]
        driver_path: Option<PathBuf>,

        /// Running WebDriver endpoint (used when no driver path is given)
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Skip image downloads
        #[arg(long)]
        no_images: bool,

        /// Only scrape this category
        #[arg(long)]
        category: Option<Category>,

        /// Only scrape this gender
        #[arg(long)]
        gender: Option<Gender>,

        /// Maximum keywords per category/gender pair
        #[arg(long)]
        max_keywords: Option<usize>,
    },

    /// List the category/gender/keyword sections
    Sections {
        /// Only list this category
        #[arg(long)]
        category: Option<Category>,

        /// Only list this gender
        #[arg(long)]
        gender: Option<Gender>,
    },

    /// Compute CLIP embeddings for a dataset CSV
    #[cfg(feature = "clip")]
    Embed {
        /// Dataset CSV written by scrape
        dataset: PathBuf,
    },

    /// Find products similar to a dataset row or an image
    Similar(SimilarArgs),

    /// Count images under a directory by extension and folder
    Images {
        /// Directory to scan
        dir: PathBuf,
    },
}

#[derive(Args)]
struct SimilarArgs {
    /// Dataset CSV with embedding columns
    dataset: PathBuf,

    /// Query with this dataset row (0-based)
    #[arg(long)]
    row: Option<usize>,

    /// Query with an image file
    #[cfg(feature = "clip")]
    #[arg(long, conflicts_with = "row")]
    image: Option<PathBuf>,

    /// Number of matches to show
    #[arg(short, long, default_value = "5")]
    top: usize,

    /// Only consider this category
    #[arg(long)]
    category: Option<Category>,

    /// Only consider this gender
    #[arg(long)]
    gender: Option<Gender>,

    /// Only consider this price tier
    #[arg(long)]
    tier: Option<PriceTier>,

    /// Minimum effective price in rupees
    #[arg(long)]
    min_price: Option<f64>,

    /// Maximum effective price in rupees
    #[arg(long)]
    max_price: Option<f64>,
}

impl SimilarArgs {
    fn query(&self) -> Result<SimilarQuery> {
        #[cfg(feature = "clip")]
        let image = self.image.clone().map(SimilarQuery::Image);
        #[cfg(not(feature = "clip"))]
        let image: Option<SimilarQuery> = None;

        self.row
            .map(SimilarQuery::Row)
            .or(image)
            .context("Pass --row <n> (or --image <path> when built with the clip feature)")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Scrapes also log to a per-run file
    let timestamp = run_timestamp();
    let log_file = matches!(cli.command, Commands::Scrape { .. })
        .then_some((config.log_dir.as_path(), timestamp.as_str()));
    let _log_guard = logging::init(cli.verbose, log_file)?;

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Scrape {
            browser,
            driver_path,
            webdriver_url,
            headed,
            no_images,
            category,
            gender,
            max_keywords,
        } => {
            if let Some(browser) = browser {
                config.browser = browser;
            }
            if driver_path.is_some() {
                config.driver_path = driver_path;
            }
            if let Some(url) = webdriver_url {
                config.webdriver_url = url;
            }
            if headed {
                config.headless = false;
            }
            if no_images {
                config.download_images = false;
            }

            let selection = SectionSelection { category, gender, max_keywords };
            let cmd = ScrapeCommand::new(config, selection).with_timestamp(timestamp);
            let output = cmd.execute().await?;
            println!("{}", output);
        }

        Commands::Sections { category, gender } => {
            let selection = SectionSelection { category, gender, max_keywords: None };
            let formatter = Formatter::new(config.format);
            println!("{}", formatter.format_sections(&selection.sections()));
        }

        #[cfg(feature = "clip")]
        Commands::Embed { dataset } => {
            use culture_scraper::commands::EmbedCommand;
            let output = EmbedCommand::new(config).execute(&dataset)?;
            println!("{}", output);
        }

        Commands::Similar(args) => {
            let query = args.query()?;

            let filters = FilterChainBuilder::new()
                .category(args.category)
                .gender(args.gender)
                .tier(args.tier)
                .price_range(args.min_price, args.max_price)
                .build();

            #[cfg(feature = "clip")]
            let clip = match &query {
                SimilarQuery::Image(_) => Some(culture_scraper::embedding::ClipEmbedder::new()?),
                SimilarQuery::Row(_) => None,
            };
            #[cfg(feature = "clip")]
            let embedder = clip.as_ref().map(|c| c as &dyn ImageEmbedder);
            #[cfg(not(feature = "clip"))]
            let embedder: Option<&dyn ImageEmbedder> = None;

            let cmd = SimilarCommand::new(config, args.top, filters);
            let output = cmd.execute(&args.dataset, &query, embedder)?;
            println!("{}", output);
        }

        Commands::Images { dir } => {
            let output = ImagesCommand::new(config).execute(&dir)?;
            println!("{}", output);
        }
    }

    Ok(())
}
