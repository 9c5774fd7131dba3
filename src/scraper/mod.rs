//! Menu acquisition from a restaurant's website and its map listing.
//!
//! # Architecture
//!
//! ```text
//! website URL → WebsiteScraper (HTTP, then headless browser) ┐
//!                                                              ├→ ScrapeResult
//! place id    → MapsScraper (map listing, Menu tab)           ┘
//! ```
//!
//! Both scrapers open their own browser page through a [`PageLauncher`] and
//! close it on every exit path.
//!
//! # Usage
//!
//! ```rust,ignore
//! use menuscout::scraper::{ChromeLauncher, MapsScraper, Scraper, ScraperConfig};
//!
//! let config = ScraperConfig::default();
//! let launcher = Arc::new(ChromeLauncher::new(config.clone()));
//! let maps = MapsScraper::new(launcher, config);
//!
//! let menu = maps.scrape("ChIJN1t_tDeuEmsRUsoyG83frY4").await?;
//! ```

pub mod branding;
mod chrome;
mod config;
pub mod extractor;
mod maps;
pub mod page;
pub mod shadow;
#[cfg(test)]
pub(crate) mod testing;
mod website;

pub use chrome::{ChromeLauncher, ChromePage};
pub use config::ScraperConfig;
pub use extractor::HtmlTextExtractor;
pub use maps::{is_outbound_link, place_url, MapsScraper};
pub use page::{PageDriver, PageLauncher};
pub use website::WebsiteScraper;

use crate::app::Result;
use crate::domain::ScrapeResult;
use async_trait::async_trait;

/// A single menu source.
///
/// `Ok(None)` means the source was reachable but had nothing usable.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Scrape the source identified by `target` (a URL or a place id).
    async fn scrape(&self, target: &str) -> Result<Option<ScrapeResult>>;
}
