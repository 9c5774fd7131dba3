//! Place-details lookup.

mod google;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::Result;
use crate::domain::PlaceDetails;

pub use google::GooglePlacesClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Base URL of the Places API
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://places.googleapis.com/v1".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl PlacesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resolves a place id to the details needed to scrape and persist it.
#[async_trait]
pub trait PlaceDirectory: Send + Sync {
    async fn details(&self, place_id: &str) -> Result<PlaceDetails>;
}
