//! Images command: inventory of a downloaded image tree.

use crate::config::Config;
use crate::format::Formatter;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions counted as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "avif"];

/// Number of file names listed per folder.
const SAMPLE_SIZE: usize = 3;

/// Image files found directly inside one folder.
#[derive(Debug, Clone, Serialize)]
pub struct FolderSummary {
    /// Path relative to the inventory root ("." for the root itself)
    pub path: String,
    pub images: usize,
    pub samples: Vec<String>,
}

/// Image counts for a directory tree.
#[derive(Debug, Clone, Serialize)]
pub struct ImageInventory {
    pub root: PathBuf,
    pub total: usize,
    pub by_extension: BTreeMap<String, usize>,
    pub folders: Vec<FolderSummary>,
}

impl ImageInventory {
    /// Walks `root` and counts image files by extension and folder.
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            bail!("Not a directory: {}", root.display());
        }

        let mut inventory = Self {
            root: root.to_path_buf(),
            total: 0,
            by_extension: BTreeMap::new(),
            folders: Vec::new(),
        };

        inventory.visit(root)?;
        inventory.folders.sort_by(|a, b| a.path.cmp(&b.path));

        debug!("Found {} images under {}", inventory.total, root.display());

        Ok(inventory)
    }

    fn visit(&mut self, dir: &Path) -> Result<()> {
        let mut entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());

        let mut images = Vec::new();

        for entry in entries {
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.visit(&path)?;
                continue;
            }

            let Some(ext) = image_extension(&path) else {
                continue;
            };

            *self.by_extension.entry(ext).or_default() += 1;
            images.push(entry.file_name().to_string_lossy().into_owned());
        }

        if !images.is_empty() {
            self.total += images.len();

            let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
            let path = match relative.to_string_lossy().replace('\\', "/") {
                p if p.is_empty() => ".".to_string(),
                p => p,
            };

            self.folders.push(FolderSummary {
                path,
                images: images.len(),
                samples: images.into_iter().take(SAMPLE_SIZE).collect(),
            });
        }

        Ok(())
    }
}

/// Lowercased extension if the file looks like an image.
fn image_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Prints an image inventory.
pub struct ImagesCommand {
    config: Config,
}

impl ImagesCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn execute(&self, root: &Path) -> Result<String> {
        let inventory = ImageInventory::scan(root)?;
        Ok(Formatter::new(self.config.format).format_inventory(&inventory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_scan_counts_by_extension_and_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        for name in ["a.jpg", "b.jpg", "c.JPG", "d.png"] {
            touch(&root.join("Shoes/Men").join(name));
        }
        touch(&root.join("Bags/Women/e.webp"));
        touch(&root.join("Bags/Women/notes.txt"));
        touch(&root.join("cover.jpeg"));
        std::fs::create_dir_all(root.join("Empty")).unwrap();

        let inventory = ImageInventory::scan(root).unwrap();

        assert_eq!(inventory.total, 6);
        assert_eq!(inventory.by_extension["jpg"], 3);
        assert_eq!(inventory.by_extension["png"], 1);
        assert_eq!(inventory.by_extension["webp"], 1);
        assert_eq!(inventory.by_extension["jpeg"], 1);
        assert!(!inventory.by_extension.contains_key("txt"));

        let paths: Vec<&str> = inventory.folders.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![".", "Bags/Women", "Shoes/Men"]);

        let shoes = &inventory.folders[2];
        assert_eq!(shoes.images, 4);
        assert_eq!(shoes.samples, vec!["a.jpg", "b.jpg", "c.JPG"]);
    }

    #[test]
    fn test_scan_rejects_missing_dir() {
        assert!(ImageInventory::scan(Path::new("/nonexistent/images")).is_err());
    }

    #[test]
    fn test_execute_table() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Shoes/Men/a.jpg"));

        let output = ImagesCommand::new(Config::new()).execute(dir.path()).unwrap();
        assert!(output.contains("Shoes/Men"));
        assert!(output.contains("a.jpg"));
        assert!(output.contains("Total: 1 images"));
    }
}
