//! Similar command: rank dataset products by image-embedding similarity.

use crate::config::Config;
use crate::dataset;
use crate::embedding::{embed_checked, ImageEmbedder};
use crate::filters::FilterChain;
use crate::format::Formatter;
use crate::similarity::rank;
use crate::site::models::Product;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What to find neighbours of.
#[derive(Debug, Clone)]
pub enum SimilarQuery {
    /// A dataset row (0-based), excluded from its own results.
    Row(usize),
    /// An image file, embedded on the fly.
    Image(PathBuf),
}

/// One ranked neighbour.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarMatch {
    pub rank: usize,
    pub row: usize,
    pub score: f32,
    pub product: Product,
}

/// Ranked neighbours of a query.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarReport {
    pub query: String,
    pub filters: Vec<String>,
    pub candidates: usize,
    pub matches: Vec<SimilarMatch>,
}

/// Finds the products most similar to a query.
pub struct SimilarCommand {
    config: Config,
    top: usize,
    filters: FilterChain,
}

impl SimilarCommand {
    /// Creates a new similar command.
    pub fn new(config: Config, top: usize, filters: FilterChain) -> Self {
        Self { config, top, filters }
    }

    /// Runs the query and returns formatted output. Image queries need an
    /// embedder.
    pub fn execute(
        &self,
        dataset: &Path,
        query: &SimilarQuery,
        embedder: Option<&dyn ImageEmbedder>,
    ) -> Result<String> {
        let report = self.run(dataset, query, embedder)?;
        Ok(Formatter::new(self.config.format).format_similar(&report))
    }

    /// Runs the query and returns the ranked matches.
    pub fn run(
        &self,
        dataset: &Path,
        query: &SimilarQuery,
        embedder: Option<&dyn ImageEmbedder>,
    ) -> Result<SimilarReport> {
        let products = dataset::read_csv(dataset)?;

        let (description, embedding, exclude) = match query {
            SimilarQuery::Row(row) => {
                let Some(product) = products.get(*row) else {
                    bail!("Row {} out of range (dataset has {} rows)", row, products.len());
                };
                let Some(embedding) = product.embedding.clone() else {
                    bail!("Row {} has no embedding; run the embed command first", row);
                };
                (format!("row {}: {}", row, product.name), embedding, Some(*row))
            }
            SimilarQuery::Image(path) => {
                let Some(embedder) = embedder else {
                    bail!("Image queries need the CLIP model (build with --features clip)");
                };
                let embedding = embed_checked(embedder, path)
                    .with_context(|| format!("Failed to embed query image {}", path.display()))?;
                (format!("image {}", path.display()), embedding, None)
            }
        };

        let candidates: Vec<Option<&[f32]>> = products
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if Some(i) == exclude || !self.filters.matches(p) {
                    None
                } else {
                    p.embedding.as_deref()
                }
            })
            .collect();

        let candidate_count = candidates.iter().filter(|c| c.is_some()).count();
        if candidate_count == 0 {
            info!("No embedded candidates match the query filters");
        }
        debug!("Ranking {} candidates for {}", candidate_count, description);

        let matches = rank(&embedding, candidates, self.top)
            .into_iter()
            .enumerate()
            .map(|(i, m)| {
                let mut product = products[m.index].clone();
                product.embedding = None;
                SimilarMatch { rank: i + 1, row: m.index, score: m.score, product }
            })
            .collect();

        Ok(SimilarReport {
            query: description,
            filters: self.filters.descriptions(),
            candidates: candidate_count,
            matches,
        })
    }
}
