//! Image embeddings for downloaded product images.

use crate::site::models::{Product, EMBEDDING_DIM};
use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Maps an image file to a fixed-length vector.
pub trait ImageEmbedder: Send + Sync {
    /// Embeds a single image.
    fn embed_image(&self, path: &Path) -> Result<Vec<f32>>;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Counts from an [`embed_dataset`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbedSummary {
    pub embedded: usize,
    pub already_embedded: usize,
    pub missing_image: usize,
    pub failed: usize,
}

/// Fills in missing embeddings from each product's `image_path`, resolved
/// against `run_dir`. Failures are logged and leave the row unembedded.
pub fn embed_dataset(
    products: &mut [Product],
    embedder: &dyn ImageEmbedder,
    run_dir: &Path,
) -> EmbedSummary {
    let mut summary = EmbedSummary::default();

    for product in products.iter_mut() {
        if product.embedding.is_some() {
            summary.already_embedded += 1;
            continue;
        }

        if !product.has_image() {
            summary.missing_image += 1;
            continue;
        }

        let path = run_dir.join(&product.image_path);
        if !path.exists() {
            warn!("Image not found for '{}': {}", product.name, path.display());
            summary.missing_image += 1;
            continue;
        }

        match embed_checked(embedder, &path) {
            Ok(embedding) => {
                debug!("Embedded {}", path.display());
                product.embedding = Some(embedding);
                summary.embedded += 1;
            }
            Err(e) => {
                warn!("Failed to embed {}: {}", path.display(), e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Embedded {} images ({} already done, {} missing, {} failed)",
        summary.embedded, summary.already_embedded, summary.missing_image, summary.failed
    );

    summary
}

/// Embeds one image and checks the vector length.
pub fn embed_checked(embedder: &dyn ImageEmbedder, path: &Path) -> Result<Vec<f32>> {
    let embedding = embedder.embed_image(path)?;
    if embedding.len() != embedder.dimension() {
        bail!("expected {} components, got {}", embedder.dimension(), embedding.len());
    }
    Ok(embedding)
}

#[cfg(feature = "clip")]
pub use clip::ClipEmbedder;

#[cfg(feature = "clip")]
mod clip {
    use super::ImageEmbedder;
    use anyhow::{anyhow, Context, Result};
    use fastembed::{ImageEmbedding, ImageEmbeddingModel, ImageInitOptions};
    use std::path::Path;
    use std::sync::Mutex;
    use tracing::info;

    /// CLIP ViT-B/32 image encoder running locally through ONNX.
    pub struct ClipEmbedder {
        model: Mutex<ImageEmbedding>,
    }

    impl ClipEmbedder {
        /// Loads the model, downloading weights on first use.
        pub fn new() -> Result<Self> {
            info!("Loading CLIP ViT-B/32 image model");

            let options = ImageInitOptions::new(ImageEmbeddingModel::ClipVitB32)
                .with_show_download_progress(true);
            let model = ImageEmbedding::try_new(options).context("Failed to load CLIP model")?;

            Ok(Self { model: Mutex::new(model) })
        }
    }

    impl ImageEmbedder for ClipEmbedder {
        fn embed_image(&self, path: &Path) -> Result<Vec<f32>> {
            let embeddings = self
                .model
                .lock()
                .map_err(|_| anyhow!("CLIP model lock poisoned"))?
                .embed(vec![path], None)
                .with_context(|| format!("Failed to embed {}", path.display()))?;

            embeddings.into_iter().next().ok_or_else(|| anyhow!("CLIP returned no embedding"))
        }
    }
}
