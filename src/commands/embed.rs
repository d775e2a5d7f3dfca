//! Embed command: compute image embeddings for a scraped dataset.

use crate::config::Config;
use crate::dataset;
use crate::embedding::{embed_dataset, EmbedSummary, ImageEmbedder};
use crate::format::Formatter;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of embedding a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedReport {
    pub dataset: PathBuf,
    pub rows: usize,
    pub summary: EmbedSummary,
    /// JSON sibling rewritten alongside the CSV, if present.
    pub json: Option<PathBuf>,
}

/// Fills embedding columns of a dataset in place.
pub struct EmbedCommand {
    config: Config,
}

impl EmbedCommand {
    /// Creates a new embed command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads CLIP and embeds the dataset.
    #[cfg(feature = "clip")]
    pub fn execute(&self, dataset: &Path) -> Result<String> {
        let embedder = crate::embedding::ClipEmbedder::new()?;
        self.execute_with_embedder(dataset, &embedder)
    }

    /// Embeds with a provided embedder (for testing).
    pub fn execute_with_embedder(
        &self,
        dataset: &Path,
        embedder: &dyn ImageEmbedder,
    ) -> Result<String> {
        let report = self.run(dataset, embedder)?;
        Ok(Formatter::new(self.config.format).format_embed_report(&report))
    }

    /// Embeds every row with a local image and rewrites the dataset.
    pub fn run(&self, dataset: &Path, embedder: &dyn ImageEmbedder) -> Result<EmbedReport> {
        let mut products = dataset::read_csv(dataset)?;

        // Image paths are relative to the run directory holding the CSV
        let run_dir = dataset.parent().unwrap_or_else(|| Path::new("."));

        info!("Embedding {} rows from {}", products.len(), dataset.display());
        let summary = embed_dataset(&mut products, embedder, run_dir);

        dataset::write_csv(dataset, &products)?;

        let json_path = dataset.with_extension("json");
        let json = if json_path.exists() {
            dataset::write_json(&json_path, &products)?;
            Some(json_path)
        } else {
            None
        };

        Ok(EmbedReport { dataset: dataset.to_path_buf(), rows: products.len(), summary, json })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::tests::ByteEmbedder;
    use crate::site::catalog::{Category, Gender};
    use crate::site::models::{Product, EMBEDDING_DIM};

    fn setup(dir: &Path, with_json: bool) -> PathBuf {
        let images = dir.join("images/Shoes/Men");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("a-nike.jpg"), [7u8]).unwrap();

        let mut with_image = Product::new(Category::Shoes, Gender::Men);
        with_image.name = "A".to_string();
        with_image.image_path = "images/Shoes/Men/a-nike.jpg".to_string();

        let mut without_image = Product::new(Category::Shoes, Gender::Men);
        without_image.name = "B".to_string();

        let products = vec![with_image, without_image];
        let csv = dir.join("cc_products_ts.csv");
        dataset::write_csv(&csv, &products).unwrap();
        if with_json {
            dataset::write_json(&csv.with_extension("json"), &products).unwrap();
        }
        csv
    }

    #[test]
    fn test_embed_rewrites_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let csv = setup(dir.path(), true);

        let cmd = EmbedCommand::new(Config::new());
        let report = cmd.run(&csv, &ByteEmbedder { dim: EMBEDDING_DIM }).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.summary.embedded, 1);
        assert_eq!(report.summary.missing_image, 1);
        assert_eq!(report.json, Some(csv.with_extension("json")));

        let products = dataset::read_csv(&csv).unwrap();
        let embedding = products[0].embedding.as_ref().unwrap();
        assert_eq!(embedding.len(), EMBEDDING_DIM);
        assert_eq!(embedding[7], 1.0);
        assert!(products[1].embedding.is_none());

        let json: Vec<Product> =
            serde_json::from_str(&std::fs::read_to_string(csv.with_extension("json")).unwrap())
                .unwrap();
        assert_eq!(json, products);
    }

    #[test]
    fn test_embed_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let csv = setup(dir.path(), false);
        let cmd = EmbedCommand::new(Config::new());
        let embedder = ByteEmbedder { dim: EMBEDDING_DIM };

        cmd.run(&csv, &embedder).unwrap();
        let report = cmd.run(&csv, &embedder).unwrap();

        assert_eq!(report.summary.embedded, 0);
        assert_eq!(report.summary.already_embedded, 1);
        assert!(report.json.is_none());
    }

    #[test]
    fn test_execute_formats_table() {
        let dir = tempfile::tempdir().unwrap();
        let csv = setup(dir.path(), false);

        let output = EmbedCommand::new(Config::new())
            .execute_with_embedder(&csv, &ByteEmbedder { dim: EMBEDDING_DIM })
            .unwrap();

        assert!(output.contains("Embedded:"));
        assert!(output.contains("1"));
    }
}
