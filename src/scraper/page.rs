use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::app::{MenuError, Result};

/// A controllable browser page.
///
/// The scraping algorithms only need to navigate, run scripts, read the
/// rendered document and wait; keeping the surface this narrow lets them run
/// against a scripted page in tests.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait until the DOM is ready.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String>;

    /// URL of the current document.
    async fn current_url(&self) -> Result<Option<String>>;

    /// Let client-side rendering catch up.
    async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Close the page and release the browser behind it.
    async fn close(self: Box<Self>);
}

/// Evaluate `script` and deserialize the result.
pub async fn evaluate_as<T: DeserializeOwned>(page: &dyn PageDriver, script: &str) -> Result<T> {
    let value = page.evaluate(script).await?;
    serde_json::from_value(value)
        .map_err(|e| MenuError::Browser(format!("Unexpected script result: {}", e)))
}

/// Opens fresh pages, each backed by a browser instance the page owns.
#[async_trait]
pub trait PageLauncher: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageDriver>>;
}
