//! Scrape command: visit every selected section, download images and write
//! the run's dataset.

use crate::config::Config;
use crate::dataset::{self, DatasetPaths, DatasetWriter};
use crate::download::{image_location, DownloadOutcome, ImageDownloader};
use crate::format::Formatter;
use crate::site::catalog::{Category, Gender, Section, SectionSelection};
use crate::site::{BrowserSession, ListingSource, Parser, Product};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one section visit.
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub category: Category,
    pub gender: Gender,
    pub keyword: String,
    pub products: usize,
    pub images: usize,
    pub error: Option<String>,
}

impl SectionReport {
    fn new(section: &Section) -> Self {
        Self {
            category: section.category,
            gender: section.gender,
            keyword: section.keyword.to_string(),
            products: 0,
            images: 0,
            error: None,
        }
    }
}

/// Image download totals for a run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImageStats {
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
    pub no_url: usize,
}

/// Summary of a scrape run.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub timestamp: String,
    pub run_dir: PathBuf,
    pub sections: Vec<SectionReport>,
    pub total_products: usize,
    pub images: ImageStats,
    pub dataset: DatasetPaths,
}

impl ScrapeReport {
    /// Sections that failed to load or parse.
    pub fn failed_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Runs a full scrape.
pub struct ScrapeCommand {
    config: Config,
    selection: SectionSelection,
    timestamp: Option<String>,
}

impl ScrapeCommand {
    /// Creates a new scrape command.
    pub fn new(config: Config, selection: SectionSelection) -> Self {
        Self { config, selection, timestamp: None }
    }

    /// Names the run with this timestamp instead of the current time, so the
    /// run directory matches the log file.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Starts a browser session, scrapes, and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let session = BrowserSession::launch(&self.config).await?;

        let result = self.run(&session).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        let report = result?;
        Ok(Formatter::new(self.config.format).format_scrape_report(&report))
    }

    /// Scrapes with a provided listing source (for testing).
    pub async fn run(&self, source: &impl ListingSource) -> Result<ScrapeReport> {
        let timestamp = self.timestamp.clone().unwrap_or_else(dataset::run_timestamp);
        let run_dir =
            dataset::run_dir(&self.config.output_dir, &self.config.output_prefix, &timestamp);

        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;

        let downloader = if self.config.download_images {
            Some(ImageDownloader::new(&self.config).context("Failed to create HTTP client")?)
        } else {
            None
        };

        let parser = Parser::new(source.base_url());
        let sections = self.selection.sections();

        info!("Scraping {} sections into {}", sections.len(), run_dir.display());

        let mut products: Vec<Product> = Vec::new();
        let mut reports = Vec::with_capacity(sections.len());
        let mut images = ImageStats::default();

        for (i, section) in sections.iter().enumerate() {
            info!(
                "[{}/{}] {} / {} / {}",
                i + 1,
                sections.len(),
                section.category,
                section.gender,
                section.keyword
            );

            let mut report = SectionReport::new(section);

            let listing = match source.load_listing(section.keyword).await.and_then(|html| {
                parser.parse_listing(&html, section.keyword, section.category, section.gender)
            }) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Skipping '{}': {:#}", section.keyword, e);
                    report.error = Some(format!("{:#}", e));
                    reports.push(report);
                    continue;
                }
            };

            report.products = listing.count();

            for mut product in listing.products {
                if let Some(downloader) = &downloader {
                    if self.fetch_image(downloader, &run_dir, &mut product, &mut images).await {
                        report.images += 1;
                    }
                }
                products.push(product);
            }

            debug!("'{}': {} products, {} images", section.keyword, report.products, report.images);
            reports.push(report);
        }

        if products.is_empty() {
            warn!("No products scraped; writing an empty dataset");
        }
        let dataset =
            DatasetWriter::new(&run_dir, &self.config.output_prefix).write(&products, &timestamp)?;

        info!("Scraped {} products", products.len());

        Ok(ScrapeReport {
            timestamp,
            run_dir,
            sections: reports,
            total_products: products.len(),
            images,
            dataset,
        })
    }

    /// Downloads a product's image and records its relative path. Returns
    /// true if the image is on disk afterwards.
    async fn fetch_image(
        &self,
        downloader: &ImageDownloader,
        run_dir: &Path,
        product: &mut Product,
        stats: &mut ImageStats,
    ) -> bool {
        let location =
            image_location(&product.name, &product.brand, product.category, product.gender);
        let relative = location.relative_path();

        match downloader.download(&product.image_url, &run_dir.join(&relative)).await {
            DownloadOutcome::Downloaded { .. } => stats.downloaded += 1,
            DownloadOutcome::AlreadyPresent { .. } => stats.already_present += 1,
            DownloadOutcome::Skipped => {
                stats.no_url += 1;
                return false;
            }
            DownloadOutcome::Failed { .. } => {
                stats.failed += 1;
                return false;
            }
        }

        product.image_path = relative.to_string_lossy().replace('\\', "/");
        true
    }
}
