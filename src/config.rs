//! Scraper settings loaded from TOML, then `CC_*` variables, then CLI flags.

use crate::site::browser::Browser;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Site the scraper targets.
pub const DEFAULT_BASE_URL: &str = "https://culture-circle.com";

/// Scraper settings: browser, pacing, downloads, output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site root, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Browser to automate
    #[serde(default)]
    pub browser: Browser,

    /// WebDriver executable to spawn (chromedriver, msedgedriver, geckodriver)
    #[serde(default)]
    pub driver_path: Option<PathBuf>,

    /// Port for a spawned WebDriver
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,

    /// Already-running WebDriver endpoint, used when no driver_path is set
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Page load timeout in seconds
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// Wait after navigation before scrolling, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Random jitter added to every wait (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Pause after each scroll, in milliseconds
    #[serde(default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,

    /// Hard cap on scrolls per listing
    #[serde(default = "default_max_scrolls")]
    pub max_scrolls: u32,

    /// Stop scrolling after this many scrolls without new cards
    #[serde(default = "default_no_growth_cycles")]
    pub no_growth_cycles: u32,

    /// Download product images
    #[serde(default = "default_true")]
    pub download_images: bool,

    /// Attempts per image before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between image attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout for image downloads, in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Directory that receives run directories
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Prefix for run directories and dataset files
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Directory for per-run scrape log files
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Console output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_driver_port() -> u16 {
    9515
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_true() -> bool {
    true
}

fn default_page_load_timeout_secs() -> u64 {
    20
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    800
}

fn default_scroll_pause_ms() -> u64 {
    1500
}

fn default_max_scrolls() -> u32 {
    200
}

fn default_no_growth_cycles() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_download_timeout_secs() -> u64 {
    12
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_output_prefix() -> String {
    "culturecircle".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            browser: Browser::default(),
            driver_path: None,
            driver_port: default_driver_port(),
            webdriver_url: default_webdriver_url(),
            headless: true,
            page_load_timeout_secs: default_page_load_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            scroll_pause_ms: default_scroll_pause_ms(),
            max_scrolls: default_max_scrolls(),
            no_growth_cycles: default_no_growth_cycles(),
            download_images: true,
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            download_timeout_secs: default_download_timeout_secs(),
            output_dir: default_output_dir(),
            output_prefix: default_output_prefix(),
            log_dir: default_log_dir(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one TOML file; unset keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading settings from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read settings file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Explicit path, else `./config.toml`, else the user config dir, else defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let user_file =
            dirs::config_dir().map(|dir| dir.join("culture-scraper").join("config.toml"));
        let found = std::iter::once(PathBuf::from("config.toml"))
            .chain(user_file)
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No settings file, running on defaults");
                Ok(Self::default())
            }
        }
    }

    /// `CC_*` variables win over the file but lose to CLI flags.
    pub fn with_env(mut self) -> Self {
        if let Ok(browser) = std::env::var("CC_BROWSER") {
            if let Ok(b) = browser.parse() {
                self.browser = b;
            }
        }

        if let Ok(path) = std::env::var("CC_DRIVER_PATH") {
            self.driver_path = Some(PathBuf::from(path));
        }

        if let Ok(url) = std::env::var("CC_WEBDRIVER_URL") {
            self.webdriver_url = url;
        }

        if let Ok(dir) = std::env::var("CC_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("CC_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }

        if let Ok(headless) = std::env::var("CC_HEADLESS") {
            if let Ok(h) = headless.parse() {
                self.headless = h;
            }
        }

        self
    }

    /// Settings with every wait zeroed, for tests against local mocks.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay_ms = 0;
        self.delay_jitter_ms = 0;
        self.scroll_pause_ms = 0;
        self.retry_delay_ms = 0;
        self
    }
}

/// Output format for console results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}
