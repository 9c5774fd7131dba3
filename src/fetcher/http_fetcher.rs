use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;

use crate::app::Result;
use crate::fetcher::{FetchedPage, Fetcher};
use crate::scraper::ScraperConfig;

/// Plain HTTP fetcher for HTML pages, presenting a desktop browser user agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(
                ACCEPT,
                HeaderValue::from_static("text/html,application/xhtml+xml"),
            )
            .header(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"))
            .send()
            .await?;

        response.error_for_status_ref()?;

        let final_url = response.url().to_string();
        let body = response.text().await?;

        tracing::debug!(url, final_url = %final_url, bytes = body.len(), "Fetched page");

        Ok(FetchedPage { final_url, body })
    }
}
