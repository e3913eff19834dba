//! Incremental server-sent events parser for the Mastodon streaming API.
//!
//! Chunks from `reqwest::Response::bytes_stream` can split lines (and UTF-8
//! sequences) anywhere, so bytes are buffered until a full line is seen.

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field, `None` for the default "message" type
    pub event: Option<String>,
    /// `data:` lines joined with '\n'
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every frame completed by them
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        // Comment (Mastodon sends ":thump" heartbeats)
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: update\ndata: {\"id\":\"1\"}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("update".to_string()),
                data: "{\"id\":\"1\"}".to_string(),
            }]
        );
    }

    #[test]
    fn test_frames_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: notif").is_empty());
        assert!(parser.push(b"ication\r\ndata: {\"a\":").is_empty());
        let frames = parser.push(b"1}\r\n\r\nevent: delete\ndata: 42\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("notification"));
        assert_eq!(frames[0].data, "{\"a\":1}");
        assert_eq!(frames[1].event.as_deref(), Some("delete"));
        assert_eq!(frames[1].data, "42");
    }

    #[test]
    fn test_multibyte_characters_split_across_chunks() {
        let payload = "data: caf\u{e9}\n\n".as_bytes();
        let (head, tail) = payload.split_at(10); // inside the two-byte "é"
        let mut parser = SseParser::new();
        assert!(parser.push(head).is_empty());
        let frames = parser.push(tail);
        assert_eq!(frames[0].data, "caf\u{e9}");
    }

    #[test]
    fn test_heartbeats_and_multiline_data() {
        let mut parser = SseParser::new();
        let frames = parser.push(b":thump\n\ndata: one\ndata: two\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, None);
        assert_eq!(frames[0].data, "one\ntwo");
    }
}
