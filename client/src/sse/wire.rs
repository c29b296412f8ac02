//! Incremental parser for the text/event-stream wire format.
//!
//! The server side of this workspace writes frames as
//! `event: <name>\ndata: <json>\nid: <uuid>\n\n`; this module reads that
//! format back (plus the usual variations: CRLF line endings, comment
//! lines, multi-line `data`, missing `event` field).

use tracing::debug;

/// One decoded frame, ready for dispatch by message type name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireFrame {
    /// Message type name; `"message"` when the server sent no `event` field.
    pub event: String,
    /// Raw data payload. Multi-line `data` fields are joined with `\n`.
    pub data: String,
    pub id: Option<String>,
}

/// Streaming parser. Feed it body chunks as they arrive; it hands back
/// every frame completed by that chunk and buffers the rest.
#[derive(Debug, Default)]
pub struct WireParser {
    buf: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl WireParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of the response body, returning completed frames in
    /// arrival order. A partial trailing line stays buffered until the next
    /// chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<WireFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
            } else {
                self.field(line);
            }
        }
        frames
    }

    /// Blank line: emit the buffered frame, if any data was collected.
    fn dispatch(&mut self) -> Option<WireFrame> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        let id = self.id.take();

        // Per the SSE processing model a frame with an empty data buffer is
        // discarded, event name and all.
        if data.is_empty() {
            return None;
        }

        Some(WireFrame {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: data.join("\n"),
            id,
        })
    }

    fn field(&mut self, line: &str) {
        // Lines starting with ':' are comments (used as keep-alives).
        if line.starts_with(':') {
            return;
        }

        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            // A field name with no colon has an empty value.
            None => (line, ""),
        };

        match name {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // Reconnect delay is owned by our config, not the server.
            "retry" => debug!("ignoring server retry hint: {}", value),
            other => debug!("ignoring unknown sse field: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> WireFrame {
        WireFrame {
            event: event.to_string(),
            data: data.to_string(),
            id: None,
        }
    }

    #[test]
    fn single_frame_parses() {
        let mut p = WireParser::new();
        let frames = p.push(b"event: event-change\ndata: {\"x\":1}\n\n");
        assert_eq!(frames, vec![frame("event-change", "{\"x\":1}")]);
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut p = WireParser::new();
        assert!(p.push(b"event: initial-eve").is_empty());
        assert!(p.push(b"nts\ndata: [").is_empty());
        let frames = p.push(b"]\n\n");
        assert_eq!(frames, vec![frame("initial-events", "[]")]);
    }

    #[test]
    fn two_frames_in_one_chunk() {
        let mut p = WireParser::new();
        let frames = p.push(b"data: a\n\ndata: b\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frame("message", "a"));
        assert_eq!(frames[1], frame("message", "b"));
    }

    #[test]
    fn multi_line_data_joined_with_newline() {
        let mut p = WireParser::new();
        let frames = p.push(b"data: line1\ndata: line2\n\n");
        assert_eq!(frames, vec![frame("message", "line1\nline2")]);
    }

    #[test]
    fn crlf_line_endings_accepted() {
        let mut p = WireParser::new();
        let frames = p.push(b"event: event-change\r\ndata: {}\r\n\r\n");
        assert_eq!(frames, vec![frame("event-change", "{}")]);
    }

    #[test]
    fn comment_lines_ignored() {
        let mut p = WireParser::new();
        let frames = p.push(b": keep-alive\n\ndata: x\n\n");
        assert_eq!(frames, vec![frame("message", "x")]);
    }

    #[test]
    fn frame_without_data_is_discarded() {
        let mut p = WireParser::new();
        let frames = p.push(b"event: event-change\n\ndata: y\n\n");
        // The data-less frame vanishes and does not leak its event name
        // into the following frame.
        assert_eq!(frames, vec![frame("message", "y")]);
    }

    #[test]
    fn id_field_captured() {
        let mut p = WireParser::new();
        let frames = p.push(b"event: e\ndata: d\nid: 42\n\n");
        assert_eq!(frames[0].id.as_deref(), Some("42"));
    }

    #[test]
    fn missing_value_space_is_optional() {
        let mut p = WireParser::new();
        let frames = p.push(b"event:event-change\ndata:{}\n\n");
        assert_eq!(frames, vec![frame("event-change", "{}")]);
    }

    #[test]
    fn retry_and_unknown_fields_ignored() {
        let mut p = WireParser::new();
        let frames = p.push(b"retry: 5000\nbogus: 1\ndata: d\n\n");
        assert_eq!(frames, vec![frame("message", "d")]);
    }
}
