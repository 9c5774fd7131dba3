use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{MenuError, Result};
use crate::scraper::config::ScraperConfig;
use crate::scraper::page::{PageDriver, PageLauncher};

/// Resolves once the document is interactive, or after ten seconds.
const DOM_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

fn browser_error(context: &str, e: impl std::fmt::Display) -> MenuError {
    MenuError::Browser(format!("{}: {}", context, e))
}

/// Launches one headless Chrome per page using chromiumoxide
#[derive(Clone)]
pub struct ChromeLauncher {
    config: ScraperConfig,
}

impl ChromeLauncher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageLauncher for ChromeLauncher {
    async fn open(&self) -> Result<Box<dyn PageDriver>> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.config.viewport_width, self.config.viewport_height)
            .request_timeout(self.config.timeout())
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!(
                "--window-size={},{}",
                self.config.viewport_width, self.config.viewport_height
            ));

        if !self.config.headless {
            builder = builder.with_head();
        }

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg.as_str());
        }

        let browser_config = builder
            .build()
            .map_err(|e| browser_error("Failed to build browser config", e))?;

        let (mut browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            MenuError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Spawn the browser handler
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Handle browser events
            }
        });

        let page = match open_page(&browser, &self.config.user_agent).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Box::new(ChromePage {
            browser,
            page,
            handler_task,
            timeout: self.config.timeout(),
        }))
    }
}

async fn open_page(browser: &Browser, user_agent: &str) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| browser_error("Failed to create page", e))?;

    page.set_user_agent(user_agent)
        .await
        .map_err(|e| browser_error("Failed to set user agent", e))?;

    Ok(page)
}

/// A page together with the browser process that owns it
pub struct ChromePage {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    timeout: Duration,
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| browser_error("Invalid URL", e))?;

        let response = tokio::time::timeout(self.timeout, self.page.execute(params))
            .await
            .map_err(|_| MenuError::Browser(format!("Navigation to {} timed out", url)))?
            .map_err(|e| browser_error("Navigation failed", e))?;

        if let Some(error_text) = response.result.error_text.as_deref() {
            return Err(MenuError::Browser(format!(
                "Navigation to {} failed: {}",
                url, error_text
            )));
        }

        // Wait for DOM ready rather than network idle
        match tokio::time::timeout(self.timeout, self.page.evaluate(DOM_READY_SCRIPT)).await {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!(url, state = %state, "Page ready");
            }
            Ok(Err(e)) => debug!(url, error = %e, "Could not check ready state"),
            Err(_) => warn!(url, "Timeout waiting for page ready state"),
        }

        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = tokio::time::timeout(self.timeout, self.page.evaluate(script))
            .await
            .map_err(|_| MenuError::Browser("Script execution timed out".to_string()))?
            .map_err(|e| browser_error("Script execution failed", e))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| browser_error("Failed to read page content", e))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        self.page
            .url()
            .await
            .map_err(|e| browser_error("Failed to read page URL", e))
    }

    async fn close(self: Box<Self>) {
        let ChromePage {
            mut browser,
            page,
            handler_task,
            ..
        } = *self;

        if let Err(e) = page.close().await {
            debug!(error = %e, "Failed to close page");
        }
        if let Err(e) = browser.close().await {
            debug!(error = %e, "Failed to close browser");
        }
        let _ = browser.wait().await;
        handler_task.abort();
    }
}
