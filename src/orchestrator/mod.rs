//! Runs both menu sources side by side and merges what they found.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::Result;
use crate::domain::{CombinedContent, ScrapeOutcome, ScrapeResult};
use crate::scraper::{Scraper, ScraperConfig};

pub struct ScrapeOrchestrator {
    website: Arc<dyn Scraper>,
    maps: Arc<dyn Scraper>,
    global_timeout: Duration,
    text_floor: usize,
}

impl ScrapeOrchestrator {
    pub fn new(website: Arc<dyn Scraper>, maps: Arc<dyn Scraper>, config: &ScraperConfig) -> Self {
        Self {
            website,
            maps,
            global_timeout: config.global_timeout(),
            text_floor: config.min_text_length,
        }
    }

    pub fn with_global_timeout(mut self, timeout: Duration) -> Self {
        self.global_timeout = timeout;
        self
    }

    /// Scrape the website (when known) and the map listing concurrently.
    ///
    /// A failing source counts as empty. When the pair does not finish within
    /// the global timeout both sources count as empty, including one that
    /// had already finished.
    pub async fn scrape_all(&self, place_id: &str, website_url: Option<&str>) -> ScrapeOutcome {
        let website_url = website_url.map(str::trim).filter(|u| !u.is_empty());

        let website = async {
            match website_url {
                Some(url) => isolate("website", self.website.scrape(url)).await,
                None => None,
            }
        };
        let map = isolate("map", self.maps.scrape(place_id));

        let (website, map) =
            match tokio::time::timeout(self.global_timeout, futures::future::join(website, map))
                .await
            {
                Ok(pair) => pair,
                Err(_) => {
                    warn!(
                        place_id,
                        timeout_secs = self.global_timeout.as_secs(),
                        "Scrape timed out, discarding both sources"
                    );
                    (None, None)
                }
            };

        let outcome = merge(website, map, self.text_floor);
        info!(
            place_id,
            chars = outcome.combined.text.len(),
            has_website_content = outcome.has_website_content,
            has_branding = outcome.combined.has_branding(),
            "Scrape finished"
        );
        outcome
    }
}

async fn isolate(
    source: &'static str,
    scrape: impl Future<Output = Result<Option<ScrapeResult>>>,
) -> Option<ScrapeResult> {
    match scrape.await {
        Ok(result) => result,
        Err(e) => {
            warn!(source, error = %e, "Menu source failed");
            None
        }
    }
}

/// Combine both sources. Website text comes first and website branding wins.
pub fn merge(website: Option<ScrapeResult>, map: Option<ScrapeResult>, floor: usize) -> ScrapeOutcome {
    let website_text = website.as_ref().and_then(|w| w.usable_text(floor));
    let map_text = map.as_ref().and_then(|m| m.usable_text(floor));

    let text = [website_text, map_text]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string();

    let pick = |field: fn(&ScrapeResult) -> Option<String>| {
        website
            .as_ref()
            .and_then(field)
            .or_else(|| map.as_ref().and_then(field))
    };
    let logo = pick(|r| r.logo.clone().filter(|l| !l.trim().is_empty()));
    let menu_url = pick(|r| r.menu_url.clone());
    let colors = website
        .as_ref()
        .and_then(|w| w.colors.clone())
        .or_else(|| map.as_ref().and_then(|m| m.colors.clone()));

    let has_website_content = website_text.is_some();
    ScrapeOutcome {
        combined: CombinedContent {
            text,
            logo,
            colors,
            menu_url,
        },
        has_website_content,
        website,
        map,
    }
}
