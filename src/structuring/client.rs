use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{MenuError, Result};
use crate::domain::{MenuChunk, StructuredMenu};
use crate::structuring::decode::{ChunkDecoder, SseDecoder, SseEvent};
use crate::structuring::prompt::{is_placeholder, system_prompt, user_prompt};
use crate::structuring::{LlmConfig, MenuStructurer};

/// Chat completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    stream: bool,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamEvent {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Menu structuring over an OpenAI-compatible chat completions API.
pub struct ChatMenuStructurer {
    client: Client,
    config: LlmConfig,
}

impl ChatMenuStructurer {
    pub fn new(config: LlmConfig) -> Result<Self> {
        // No whole-request timeout here: it would also cut off long streams.
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    fn request(&self, body: &ChatRequest<'_>) -> RequestBuilder {
        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let mut request = self.client.post(url).json(body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }
        request
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MenuError::Structuring(format!(
            "HTTP {}: {}",
            status,
            body.trim()
        )))
    }
}

#[async_trait]
impl MenuStructurer for ChatMenuStructurer {
    async fn parse(
        &self,
        text: &str,
        restaurant_name: &str,
        has_website_content: bool,
    ) -> Result<StructuredMenu> {
        if is_placeholder(text) {
            debug!(restaurant = restaurant_name, "No menu text, skipping model call");
            return Ok(StructuredMenu::default());
        }

        let user = user_prompt(text, restaurant_name, has_website_content);
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            stream: false,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt(false),
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .request(&body)
            .timeout(self.config.timeout())
            .send()
            .await?;
        let reply: ChatResponse = Self::check_status(response).await?.json().await?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let menu = parse_menu_json(&content)?;

        info!(
            restaurant = restaurant_name,
            items = menu.items.len(),
            "Menu structured"
        );
        Ok(menu)
    }

    async fn parse_stream(
        &self,
        text: &str,
        restaurant_name: &str,
        has_website_content: bool,
        on_chunk: &mut (dyn FnMut(MenuChunk) + Send),
    ) -> Result<()> {
        let user = user_prompt(text, restaurant_name, has_website_content);
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            stream: true,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt(true),
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            response_format: None,
        };

        let response = Self::check_status(self.request(&body).send().await?).await?;
        let mut bytes = response.bytes_stream();
        let mut sse = SseDecoder::new();
        let mut decoder = ChunkDecoder::new();
        let mut emitted = 0usize;

        let mut forward = |event: SseEvent, decoder: &mut ChunkDecoder| -> Result<bool> {
            let payload = match event {
                SseEvent::Done => return Ok(true),
                SseEvent::Data(payload) => payload,
            };
            let event: ChatStreamEvent = serde_json::from_str(&payload)?;
            for choice in event.choices {
                if let Some(content) = choice.delta.content {
                    for chunk in decoder.push(&content) {
                        emitted += 1;
                        on_chunk(chunk);
                    }
                }
            }
            Ok(false)
        };

        let mut done = false;
        while !done {
            let Some(read) = bytes.next().await else {
                break;
            };
            for event in sse.push(&read?) {
                if forward(event, &mut decoder)? {
                    done = true;
                    break;
                }
            }
        }
        if !done {
            if let Some(event) = sse.finish() {
                forward(event, &mut decoder)?;
            }
        }
        drop(forward);

        if let Some(chunk) = decoder.finish() {
            emitted += 1;
            on_chunk(chunk);
        }

        info!(
            restaurant = restaurant_name,
            chunks = emitted,
            "Menu stream finished"
        );
        Ok(())
    }
}

/// Parse a single-shot reply, tolerating a surrounding code fence.
fn parse_menu_json(content: &str) -> Result<StructuredMenu> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(StructuredMenu::default());
    }
    let json = content
        .strip_prefix("```json")
        .or_else(|| content.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(content)
        .trim();

    serde_json::from_str(json)
        .map_err(|e| MenuError::Structuring(format!("Model returned invalid menu JSON: {}", e)))
}
