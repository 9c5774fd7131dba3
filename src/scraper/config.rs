use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::USABLE_TEXT_FLOOR;

/// Configuration for both menu scrapers and the orchestrator around them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// User agent string presented by both the HTTP client and the browser
    pub user_agent: String,

    /// Browser viewport width in pixels (default: 1920)
    pub viewport_width: u32,

    /// Browser viewport height in pixels (default: 1080)
    pub viewport_height: u32,

    /// Page navigation timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Timeout for plain HTTP fetches in seconds (default: 10)
    pub http_timeout_secs: u64,

    /// Settle delay after a website reaches DOM ready, in milliseconds (default: 1000)
    pub wait_after_load_ms: u64,

    /// Settle delay after the map page reaches DOM ready, in milliseconds (default: 2000)
    pub map_wait_after_load_ms: u64,

    /// Delay after clicking a tab, in milliseconds (default: 1500)
    pub tab_settle_ms: u64,

    /// Pixels scrolled per scroll-to-exhaustion step (default: 5000)
    pub scroll_step_px: u32,

    /// Delay between scroll steps, in milliseconds (default: 800)
    pub scroll_interval_ms: u64,

    /// Maximum scroll steps per panel (default: 5)
    pub max_scroll_attempts: u32,

    /// Wall-clock budget for both scrapers together, in seconds (default: 120)
    pub global_timeout_secs: u64,

    /// Maximum characters kept from a page (default: 2500)
    pub max_text_length: usize,

    /// Minimum characters for a source to count as having content (default: 100)
    pub min_text_length: usize,

    /// Maximum image URLs reported per source (default: 20)
    pub max_images: usize,

    /// Extra Chrome arguments
    pub chrome_args: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            timeout_secs: 30,
            http_timeout_secs: 10,
            wait_after_load_ms: 1000,
            map_wait_after_load_ms: 2000,
            tab_settle_ms: 1500,
            scroll_step_px: 5000,
            scroll_interval_ms: 800,
            max_scroll_attempts: 5,
            global_timeout_secs: 120,
            max_text_length: 2500,
            min_text_length: USABLE_TEXT_FLOOR,
            max_images: 20,
            chrome_args: Vec::new(),
        }
    }
}

impl ScraperConfig {
    /// Get the page navigation timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    pub fn map_wait_after_load(&self) -> Duration {
        Duration::from_millis(self.map_wait_after_load_ms)
    }

    pub fn tab_settle(&self) -> Duration {
        Duration::from_millis(self.tab_settle_ms)
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms)
    }

    /// Get the joint scrape budget as a Duration
    pub fn global_timeout(&self) -> Duration {
        Duration::from_secs(self.global_timeout_secs)
    }

    /// Create a config optimized for speed (less accurate)
    pub fn fast() -> Self {
        Self {
            timeout_secs: 15,
            wait_after_load_ms: 500,
            map_wait_after_load_ms: 1000,
            tab_settle_ms: 750,
            scroll_interval_ms: 400,
            global_timeout_secs: 60,
            ..Default::default()
        }
    }
}
