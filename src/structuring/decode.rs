//! Incremental decoding of a streamed chat completion.
//!
//! The transport is server-sent events: `data: <json>` lines with a final
//! `data: [DONE]`. Inside the completion the model writes one JSON chunk per
//! line. Both layers can split anywhere, so each decoder buffers until it
//! has a whole line.

use tracing::debug;

use crate::domain::MenuChunk;

#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Splits a byte stream into server-sent `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line)
    }
}

fn parse_line(line: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(line);
    let payload = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }
    Some(SseEvent::Data(payload.to_string()))
}

/// Turns model output text into [`MenuChunk`]s, one JSON object per line.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    buffer: String,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) -> Vec<MenuChunk> {
        self.buffer.push_str(text);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(chunk) = parse_chunk(&line) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    pub fn finish(&mut self) -> Option<MenuChunk> {
        let line = std::mem::take(&mut self.buffer);
        parse_chunk(&line)
    }
}

fn parse_chunk(line: &str) -> Option<MenuChunk> {
    let line = line.trim().trim_end_matches(',');
    if line.is_empty() || line.starts_with("```") {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            debug!(line, error = %e, "Skipping undecodable menu line");
            None
        }
    }
}
