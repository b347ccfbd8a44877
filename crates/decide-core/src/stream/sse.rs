//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers until a full line
//! is available, so multi-byte characters split across chunks survive.
//! An event that has not been terminated by a blank line when the body
//! ends is discarded.

use serde::Serialize;
use serde_json::Value;

/// Event type used when a frame carries no `event:` line.
pub const DEFAULT_EVENT: &str = "message";

/// Decoded `data:` payload: JSON when it parses, otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn parse(data: &str) -> Self {
        match serde_json::from_str(data) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(data.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Text(_) => None,
        }
    }

    /// The payload as text: raw text verbatim, JSON strings unquoted,
    /// other JSON re-serialized.
    pub fn to_text(&self) -> String {
        match self {
            Payload::Text(s) => s.clone(),
            Payload::Json(Value::String(s)) => s.clone(),
            Payload::Json(v) => v.to_string(),
        }
    }
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SseFrame {
    pub event: String,
    pub data: Payload,
}

impl SseFrame {
    pub fn new(event: impl Into<String>, data: &str) -> Self {
        Self {
            event: event.into(),
            data: Payload::parse(data),
        }
    }
}

#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: String,
    data_lines: Vec<String>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            event: DEFAULT_EVENT.to_string(),
            data_lines: Vec::new(),
        }
    }

    /// Feed a chunk of the body; returns every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = text.strip_suffix('\r').unwrap_or(text.as_ref());
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// True when bytes or data lines are buffered that no blank line has
    /// dispatched yet.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || !self.data_lines.is_empty()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            let frame = if self.data_lines.is_empty() {
                None
            } else {
                let data = self.data_lines.join("\n");
                Some(SseFrame {
                    event: self.event.clone(),
                    data: Payload::parse(&data),
                })
            };
            self.event = DEFAULT_EVENT.to_string();
            self.data_lines.clear();
            return frame;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            self.event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            self.data_lines.push(rest.trim_start().to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_typed_json_event() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"event: vector_ranked\ndata: {\"core_nodes\": []}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "vector_ranked");
        assert_eq!(frames[0].data, Payload::Json(json!({"core_nodes": []})));
    }

    #[test]
    fn event_type_defaults_to_message_and_resets() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"event: a\ndata: 1\n\ndata: 2\n\n");
        assert_eq!(frames[0].event, "a");
        assert_eq!(frames[1].event, DEFAULT_EVENT);
    }

    #[test]
    fn chunk_boundaries_do_not_matter() {
        let body = "event: error\r\ndata: {\"message\":\"déjà\"}\r\n\r\n".as_bytes();
        let mut whole = SseDecoder::new();
        let expected = whole.feed(body);
        let mut split = SseDecoder::new();
        let mut got = Vec::new();
        for b in body {
            got.extend(split.feed(std::slice::from_ref(b)));
        }
        assert_eq!(got, expected);
        assert_eq!(got[0].data, Payload::Json(json!({"message": "déjà"})));
    }

    #[test]
    fn multiline_data_is_joined() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"data: first\ndata:second\n\n");
        assert_eq!(frames[0].data, Payload::Text("first\nsecond".to_string()));
    }

    #[test]
    fn comments_and_ids_are_ignored() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b": keepalive\nid: 7\nretry: 100\n\n");
        assert!(frames.is_empty());
    }

    #[test]
    fn unterminated_event_stays_pending() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"event: x\ndata: 1\n").is_empty());
        assert!(d.has_pending());
    }

    #[test]
    fn payload_text_conversion() {
        assert_eq!(Payload::parse("boom").to_text(), "boom");
        assert_eq!(Payload::parse("\"quoted\"").to_text(), "quoted");
        assert_eq!(Payload::parse("{\"a\":1}").to_text(), "{\"a\":1}");
    }
}
