//! WebDriver browser session for loading JS-rendered listing pages.

use crate::config::Config;
use crate::site::catalog::search_url;
use crate::site::selectors;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Desktop user agents rotated per session and per image request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
];

/// Connection attempts while a spawned driver boots.
const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_RETRY_MS: u64 = 250;

/// Returns a random entry of [`USER_AGENTS`].
pub fn random_user_agent() -> &'static str {
    USER_AGENTS[rand::rng().random_range(0..USER_AGENTS.len())]
}

/// Sleeps `base_ms` plus up to `jitter_ms` of random extra time.
pub async fn human_delay(base_ms: u64, jitter_ms: u64) {
    let jitter = if jitter_ms > 0 { rand::rng().random_range(0..=jitter_ms) } else { 0 };

    let total = base_ms + jitter;
    if total == 0 {
        return;
    }

    debug!("Delaying {}ms", total);
    tokio::time::sleep(Duration::from_millis(total)).await;
}

/// Browser driven over WebDriver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Edge,
    Firefox,
}

impl Browser {
    /// W3C `browserName` capability.
    pub fn browser_name(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Edge => "MicrosoftEdge",
            Browser::Firefox => "firefox",
        }
    }

    /// Builds the session capabilities for this browser.
    pub fn capabilities(
        &self,
        headless: bool,
        user_agent: &str,
        page_load_timeout: Duration,
    ) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!(self.browser_name()));
        caps.insert(
            "timeouts".to_string(),
            json!({ "pageLoad": page_load_timeout.as_millis() as u64 }),
        );

        match self {
            Browser::Chrome | Browser::Edge => {
                let mut args = vec![
                    "--disable-blink-features=AutomationControlled".to_string(),
                    format!("--user-agent={}", user_agent),
                ];
                if headless {
                    args.insert(0, "--headless=new".to_string());
                }

                let key = if *self == Browser::Edge { "ms:edgeOptions" } else { "goog:chromeOptions" };
                caps.insert(key.to_string(), json!({ "args": args }));
            }
            Browser::Firefox => {
                let args: Vec<&str> = if headless { vec!["-headless"] } else { Vec::new() };
                caps.insert(
                    "moz:firefoxOptions".to_string(),
                    json!({
                        "args": args,
                        "prefs": { "general.useragent.override": user_agent },
                    }),
                );
            }
        }

        caps
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Browser::Chrome => write!(f, "chrome"),
            Browser::Edge => write!(f, "edge"),
            Browser::Firefox => write!(f, "firefox"),
        }
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "edge" | "msedge" | "microsoftedge" => Ok(Browser::Edge),
            "firefox" | "gecko" => Ok(Browser::Firefox),
            _ => Err(format!("Unknown browser: {}. Use: chrome, edge, firefox", s)),
        }
    }
}

/// Source of rendered listing pages - enables mocking for tests.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Loads the search listing for a keyword and returns its rendered HTML.
    async fn load_listing(&self, keyword: &str) -> Result<String>;

    /// Site root used to resolve relative product links.
    fn base_url(&self) -> &str;
}

/// Scrolling behaviour for infinite listings.
#[derive(Debug, Clone, Copy)]
struct ScrollSettings {
    settle_delay_ms: u64,
    jitter_ms: u64,
    pause_ms: u64,
    max_scrolls: u32,
    no_growth_cycles: u32,
}

/// A live WebDriver session, optionally owning the driver process.
pub struct BrowserSession {
    client: Client,
    driver: Option<Child>,
    base_url: String,
    scroll: ScrollSettings,
}

impl BrowserSession {
    /// Starts (or connects to) a WebDriver and opens a browser session.
    ///
    /// Failure here is fatal for a run.
    pub async fn launch(config: &Config) -> Result<Self> {
        let (driver, url) = match &config.driver_path {
            Some(path) => {
                info!("Starting WebDriver: {}", path.display());
                let child = Command::new(path)
                    .arg(format!("--port={}", config.driver_port))
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                    .with_context(|| format!("Failed to start WebDriver: {}", path.display()))?;
                (Some(child), format!("http://localhost:{}", config.driver_port))
            }
            None => (None, config.webdriver_url.clone()),
        };

        let user_agent = random_user_agent();
        let caps = config.browser.capabilities(
            config.headless,
            user_agent,
            Duration::from_secs(config.page_load_timeout_secs),
        );

        debug!("Connecting to {} (browser: {}, headless: {})", url, config.browser, config.headless);
        let attempts = if driver.is_some() { CONNECT_ATTEMPTS } else { 1 };
        let client = Self::connect(&url, caps, attempts).await?;

        info!("Browser session ready ({})", config.browser);

        Ok(Self {
            client,
            driver,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            scroll: ScrollSettings {
                settle_delay_ms: config.settle_delay_ms,
                jitter_ms: config.delay_jitter_ms,
                pause_ms: config.scroll_pause_ms,
                max_scrolls: config.max_scrolls,
                no_growth_cycles: config.no_growth_cycles,
            },
        })
    }

    async fn connect(url: &str, caps: Map<String, Value>, attempts: u32) -> Result<Client> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match ClientBuilder::native().capabilities(caps.clone()).connect(url).await {
                Ok(client) => return Ok(client),
                Err(e) if attempt < attempts => {
                    debug!("WebDriver not ready (attempt {}): {}", attempt, e);
                    tokio::time::sleep(Duration::from_millis(CONNECT_RETRY_MS)).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to connect to WebDriver at {}", url))
                }
            }
        }
    }

    /// Scrolls until the card count stops growing, then returns it.
    async fn scroll_to_end(&self) -> Result<usize> {
        let mut previous = 0;
        let mut stable_cycles = 0;
        let mut scrolls = 0;

        while scrolls < self.scroll.max_scrolls && stable_cycles < self.scroll.no_growth_cycles {
            self.client
                .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
                .await
                .context("Failed to scroll")?;

            human_delay(self.scroll.pause_ms, self.scroll.jitter_ms).await;

            let count = self.client.find_all(Locator::Css(selectors::CARD)).await?.len();
            debug!("Scroll {}: {} items", scrolls + 1, count);

            if count == previous {
                stable_cycles += 1;
            } else {
                stable_cycles = 0;
            }
            previous = count;
            scrolls += 1;
        }

        Ok(previous)
    }

    /// Ends the browser session and stops a spawned driver.
    pub async fn close(self) -> Result<()> {
        let Self { client, driver, .. } = self;

        if let Err(e) = client.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        if let Some(mut child) = driver {
            debug!("Stopping WebDriver");
            child.kill().await.context("Failed to stop WebDriver")?;
        }

        Ok(())
    }
}

#[async_trait]
impl ListingSource for BrowserSession {
    async fn load_listing(&self, keyword: &str) -> Result<String> {
        let url = search_url(&self.base_url, keyword);

        info!("Loading listing: {}", keyword);
        self.client.goto(&url).await.with_context(|| format!("Failed to navigate to {}", url))?;

        human_delay(self.scroll.settle_delay_ms, self.scroll.jitter_ms).await;

        let cards = self.scroll_to_end().await?;
        debug!("{} cards loaded for '{}'", cards, keyword);

        self.client.source().await.context("Failed to read page source")
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
