//! Product image downloads with a bounded number of attempts.

use crate::config::Config;
use crate::site::browser::{human_delay, random_user_agent};
use crate::site::catalog::{Category, Gender};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Profile;

/// Name of the image tree inside a run directory.
pub const IMAGES_DIR: &str = "images";

const NAME_SLUG_LEN: usize = 60;
const BRAND_SLUG_LEN: usize = 30;

/// Why a single download attempt failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Request(#[from] wreq::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of downloading one image.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Fetched and written.
    Downloaded { path: PathBuf, attempts: u32 },
    /// The file already existed; nothing was fetched.
    AlreadyPresent { path: PathBuf },
    /// The product has no image URL.
    Skipped,
    /// Every attempt failed.
    Failed { attempts: u32, last_error: String },
}

impl DownloadOutcome {
    /// Local path of the image, if one exists now.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DownloadOutcome::Downloaded { path, .. } | DownloadOutcome::AlreadyPresent { path } => {
                Some(path)
            }
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failed { .. })
    }
}

/// Where a product image lives, relative to the run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation {
    /// `images/<Category>/<Gender>`
    pub folder: PathBuf,
    /// `<name>-<brand>.jpg`
    pub file_name: String,
}

impl ImageLocation {
    /// Path relative to the run directory.
    pub fn relative_path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

/// Computes the image location for a product.
pub fn image_location(name: &str, brand: &str, category: Category, gender: Gender) -> ImageLocation {
    let name = match slug(name, NAME_SLUG_LEN) {
        s if s.is_empty() => "unnamed".to_string(),
        s => s,
    };
    let brand = match slug(brand, BRAND_SLUG_LEN) {
        s if s.is_empty() => "nobrand".to_string(),
        s => s,
    };

    ImageLocation {
        folder: Path::new(IMAGES_DIR).join(category.as_str()).join(gender.as_str()),
        file_name: format!("{}-{}.jpg", name, brand),
    }
}

/// Lowercases, drops everything but ASCII alphanumerics and whitespace,
/// joins words with `-` and truncates to `max_len`.
fn slug(text: &str, max_len: usize) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join("-").chars().take(max_len).collect()
}

/// Downloads images with a fixed number of attempts and no backoff.
pub struct ImageDownloader {
    client: Client,
    max_attempts: u32,
    retry_delay_ms: u64,
    jitter_ms: u64,
}

impl ImageDownloader {
    /// Creates a downloader from the run configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
            retry_delay_ms: config.retry_delay_ms,
            jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Attempts limit in effect.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Downloads `url` to `dest`. Never fails the run: exhaustion is
    /// reported as [`DownloadOutcome::Failed`].
    pub async fn download(&self, url: &str, dest: &Path) -> DownloadOutcome {
        if url.trim().is_empty() {
            return DownloadOutcome::Skipped;
        }

        if dest.exists() {
            debug!("Image already present: {}", dest.display());
            return DownloadOutcome::AlreadyPresent { path: dest.to_path_buf() };
        }

        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.fetch(url).await {
                Ok(bytes) => {
                    return match write_atomically(dest, &bytes).await {
                        Ok(()) => {
                            debug!("Saved {} ({} bytes)", dest.display(), bytes.len());
                            DownloadOutcome::Downloaded { path: dest.to_path_buf(), attempts: attempt }
                        }
                        Err(e) => {
                            warn!("Image write error: {}", e);
                            DownloadOutcome::Failed { attempts: attempt, last_error: e.to_string() }
                        }
                    };
                }
                Err(e) => {
                    warn!("Image download error {} (attempt {})", e, attempt);
                    last_error = e.to_string();

                    if attempt < self.max_attempts {
                        human_delay(self.retry_delay_ms, self.jitter_ms).await;
                    }
                }
            }
        }

        warn!("Giving up on {} after {} attempts", url, self.max_attempts);
        DownloadOutcome::Failed { attempts: self.max_attempts, last_error }
    }

    /// One GET of the image.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Profile::Chrome131)
            .header("User-Agent", random_user_agent())
            .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Writes through a `.part` file so a crash never leaves a truncated image
/// at the final path.
async fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let io_err = |source| DownloadError::Write { path: dest.to_path_buf(), source };

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let partial = dest.with_extension("part");
    tokio::fs::write(&partial, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&partial, dest).await.map_err(io_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn make_downloader(max_attempts: u32) -> ImageDownloader {
        let mut config = Config::new().without_delays();
        config.max_attempts = max_attempts;
        ImageDownloader::new(&config).unwrap()
    }

    async fn flaky_server(failures: u64) -> MockServer {
        let server = MockServer::start().await;

        if failures > 0 {
            Mock::given(method("GET"))
                .and(path("/img.jpg"))
                .respond_with(ResponseTemplate::new(500))
                .up_to_n_times(failures)
                .mount(&server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG))
            .mount(&server)
            .await;

        server
    }

    #[test]
    fn test_image_location() {
        let location = image_location("Nike Dunk Low 'Panda'", "Nike", Category::Shoes, Gender::Men);
        assert_eq!(location.folder, Path::new("images").join("Shoes").join("Men"));
        assert_eq!(location.file_name, "nike-dunk-low-panda-nike.jpg");
        assert_eq!(
            location.relative_path(),
            Path::new("images/Shoes/Men/nike-dunk-low-panda-nike.jpg")
        );
    }

    #[test]
    fn test_image_location_defaults() {
        let location = image_location("", "", Category::Bags, Gender::Unisex);
        assert_eq!(location.file_name, "unnamed-nobrand.jpg");
        assert_eq!(location.folder, Path::new("images/Bags/Unisex"));
    }

    #[test]
    fn test_slug_truncation() {
        let long = "word ".repeat(30);
        let s = slug(&long, NAME_SLUG_LEN);
        assert_eq!(s.len(), 60);
        assert!(s.starts_with("word-word"));

        assert_eq!(slug("Off-White™  x  Nike", 30), "offwhite-x-nike");
        assert_eq!(slug("Émile Henry", 30), "mile-henry");
    }

    #[tokio::test]
    async fn test_download_success_first_try() {
        let server = flaky_server(0).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("images/Shoes/Men/a.jpg");

        let outcome = make_downloader(2).download(&format!("{}/img.jpg", server.uri()), &dest).await;

        match outcome {
            DownloadOutcome::Downloaded { path, attempts } => {
                assert_eq!(path, dest);
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(std::fs::read(&dest).unwrap(), JPEG);
        assert!(!dest.with_extension("part").exists());
    }

    #[tokio::test]
    async fn test_download_succeeds_when_failures_below_limit() {
        let server = flaky_server(2).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("b.jpg");

        let outcome = make_downloader(3).download(&format!("{}/img.jpg", server.uri()), &dest).await;

        match outcome {
            DownloadOutcome::Downloaded { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_download_fails_when_failures_reach_limit() {
        let server = flaky_server(3).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("c.jpg");

        let outcome = make_downloader(3).download(&format!("{}/img.jpg", server.uri()), &dest).await;

        match outcome {
            DownloadOutcome::Failed { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("500"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!dest.exists());
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_makes_exactly_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("d.jpg");

        let outcome = make_downloader(2).download(&format!("{}/gone.jpg", server.uri()), &dest).await;

        assert!(outcome.is_failure());
        assert!(outcome.path().is_none());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("e.jpg");

        let outcome = make_downloader(2).download("http://127.0.0.1:1/img.jpg", &dest).await;

        match outcome {
            DownloadOutcome::Failed { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("request failed"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_existing_file_not_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f.jpg");
        std::fs::write(&dest, b"old").unwrap();

        let outcome = make_downloader(2).download(&format!("{}/img.jpg", server.uri()), &dest).await;

        assert!(matches!(outcome, DownloadOutcome::AlreadyPresent { .. }));
        assert_eq!(outcome.path(), Some(dest.as_path()));
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_empty_url_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = make_downloader(2).download("  ", &dir.path().join("g.jpg")).await;
        assert!(matches!(outcome, DownloadOutcome::Skipped));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(make_downloader(0).max_attempts(), 1);
    }
}
