use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::app::Result;
use crate::domain::{BrandColors, ScrapeResult};
use crate::fetcher::Fetcher;
use crate::scraper::branding::{find_logo, find_meta_colors, COLOR_SAMPLING_SCRIPT};
use crate::scraper::extractor::{menu_images, HtmlTextExtractor};
use crate::scraper::page::{evaluate_as, PageDriver, PageLauncher};
use crate::scraper::{Scraper, ScraperConfig};

/// Scrapes a restaurant's own website.
///
/// A plain HTTP fetch is tried first; when it yields too little text the
/// site is rendered in a headless browser and extracted again.
pub struct WebsiteScraper {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    extractor: HtmlTextExtractor,
    launcher: Arc<dyn PageLauncher>,
    config: ScraperConfig,
}

impl WebsiteScraper {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        launcher: Arc<dyn PageLauncher>,
        config: ScraperConfig,
    ) -> Self {
        let extractor = HtmlTextExtractor::new(fetcher.clone(), &config);
        Self {
            fetcher,
            extractor,
            launcher,
            config,
        }
    }

    /// Cheap path: plain HTTP fetch without rendering.
    async fn scrape_static(&self, url: &str) -> Option<ScrapeResult> {
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                debug!(url, error = %e, "Static fetch failed, falling back to browser");
                return None;
            }
        };

        let text = self.extractor.extract(&page.body, &page.final_url).await;
        if text.chars().count() < self.config.min_text_length {
            debug!(url, chars = text.len(), "Static page too thin, falling back to browser");
            return None;
        }

        let colors = find_meta_colors(&page.body);
        Some(self.build_result(text, &page.body, &page.final_url, colors))
    }

    /// Full path: render in a browser, then extract from the rendered DOM.
    async fn scrape_rendered(&self, page: &dyn PageDriver, url: &str) -> Result<Option<ScrapeResult>> {
        page.navigate(url).await?;
        page.settle(self.config.wait_after_load()).await;

        let html = page.content().await?;
        let base = page
            .current_url()
            .await
            .ok()
            .flatten()
            .filter(|u| u.starts_with("http"))
            .unwrap_or_else(|| url.to_string());

        let text = self.extractor.extract(&html, &base).await;
        if text.chars().count() < self.config.min_text_length {
            info!(url, chars = text.len(), "Website yielded no usable menu text");
            return Ok(None);
        }

        let samples: Vec<String> = evaluate_as(page, COLOR_SAMPLING_SCRIPT)
            .await
            .unwrap_or_default();
        let colors = BrandColors::from_samples(&samples).or_else(|| find_meta_colors(&html));

        Ok(Some(self.build_result(text, &html, &base, colors)))
    }

    fn build_result(
        &self,
        text: String,
        html: &str,
        base: &str,
        colors: Option<BrandColors>,
    ) -> ScrapeResult {
        let (logo, images) = match Url::parse(base) {
            Ok(base) => (
                find_logo(html, &base),
                menu_images(html, &base, self.config.max_images),
            ),
            Err(_) => (None, Vec::new()),
        };

        ScrapeResult {
            text,
            images,
            menu_url: None,
            logo,
            colors,
        }
    }
}

#[async_trait]
impl Scraper for WebsiteScraper {
    async fn scrape(&self, url: &str) -> Result<Option<ScrapeResult>> {
        if let Some(result) = self.scrape_static(url).await {
            info!(url, chars = result.text.len(), "Website menu extracted without rendering");
            return Ok(Some(result));
        }

        let page = self.launcher.open().await?;
        let outcome = self.scrape_rendered(page.as_ref(), url).await;
        page.close().await;

        if let Ok(Some(ref result)) = outcome {
            info!(url, chars = result.text.len(), "Website menu extracted from rendered page");
        }
        outcome
    }
}
