//! Turning scraped menu text into structured menus with a language model.
//!
//! Two call shapes are offered: [`MenuStructurer::parse`] returns a whole
//! menu at once, [`MenuStructurer::parse_stream`] hands out [`MenuChunk`]s
//! as the model produces them. Chunks arrive in model order, so an item may
//! name a category before that category's own chunk; callers reassemble
//! with [`crate::domain::MenuAccumulator`].

mod client;
mod decode;
mod prompt;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::Result;
use crate::domain::{MenuChunk, StructuredMenu};

pub use client::ChatMenuStructurer;
pub use decode::{ChunkDecoder, SseDecoder, SseEvent};
pub use prompt::PLACEHOLDER_TEXT;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Whole-request timeout for single-shot calls
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[async_trait]
pub trait MenuStructurer: Send + Sync {
    /// Structure `text` in one call. Placeholder or empty text yields an
    /// empty menu.
    async fn parse(
        &self,
        text: &str,
        restaurant_name: &str,
        has_website_content: bool,
    ) -> Result<StructuredMenu>;

    /// Structure `text`, calling `on_chunk` for each chunk as it arrives.
    /// Resolves once the model signals the end of its output.
    async fn parse_stream(
        &self,
        text: &str,
        restaurant_name: &str,
        has_website_content: bool,
        on_chunk: &mut (dyn FnMut(MenuChunk) + Send),
    ) -> Result<()>;
}
