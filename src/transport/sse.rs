//! Streaming adapter: server-sent events in, POST requests out.
//!
//! Inbound updates arrive as named `update` events on a `text/event-stream`
//! response; outbound mutations are independent fire-and-forget POSTs to
//! the same resource, decoupled from the inbound channel. The online flag
//! tracks only the inbound stream; writes go out regardless.

use std::sync::Arc;

use futures_util::StreamExt;

use crate::error::Error;
use crate::map::MapState;
use crate::protocol::SyncOperation;
use crate::transport::Transport;

const UPDATE_EVENT: &str = "update";

pub struct SseTransport {
    client: reqwest::Client,
    write_url: String,
}

impl SseTransport {
    /// Subscribe to the event stream and spawn the reader task. The reader
    /// runs until the server ends the stream or the connection errors.
    pub(crate) async fn connect(url: &str, state: Arc<MapState>) -> Result<Self, Error> {
        let client = reqwest::Client::new();

        log::info!("[Collection] Opening event stream at {}", url);
        let response = client.get(url).send().await?.error_for_status()?;
        state.set_online(true);

        let reader_state = state.clone();
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut parser = EventStreamParser::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(chunk) => {
                        for event in parser.feed(&chunk) {
                            if event.name != UPDATE_EVENT {
                                log::debug!("[Collection] Ignoring {} event", event.name);
                                continue;
                            }
                            match SyncOperation::decode(&event.data) {
                                Ok(operation) => reader_state.dispatch_remote(operation),
                                Err(e) => {
                                    log::error!("[Collection] Malformed update event: {}", e);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        log::error!("[Collection] Stream error: {}", e);
                        break;
                    }
                }
            }

            reader_state.set_online(false);
            log::info!("[Collection] Event stream ended");
        });

        Ok(Self {
            client,
            write_url: url.to_owned(),
        })
    }
}

impl Transport for SseTransport {
    fn send(&self, operation: &SyncOperation) {
        let frame = match operation.encode() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("[Collection] Failed to encode operation: {}", e);
                return;
            }
        };

        // Unconditional, even while the inbound stream is down.
        let request = self.client.post(self.write_url.as_str()).body(frame);
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    log::error!("[Collection] Write rejected: {}", response.status());
                }
                Ok(_) => {}
                Err(e) => log::error!("[Collection] Write failed: {}", e),
            }
        });
    }
}

/// Incremental `text/event-stream` parser.
///
/// Feed raw bytes as they arrive; complete events come back out. Only the
/// `event` and `data` fields matter to this client; comment lines and the
/// `id`/`retry` fields are skipped. Multi-line data is joined with newlines
/// and a blank line dispatches, per the framing rules.
pub(crate) struct EventStreamParser {
    buffer: Vec<u8>,
    event_name: Option<String>,
    data: Vec<String>,
}

pub(crate) struct ServerEvent {
    pub name: String,
    pub data: String,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            event_name: None,
            data: Vec::new(),
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if line.is_empty() {
                if let Some(event) = self.flush() {
                    events.push(event);
                }
            } else {
                self.field(&String::from_utf8_lossy(&line));
            }
        }
        events
    }

    fn field(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }

        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match name {
            "event" => self.event_name = Some(value.to_owned()),
            "data" => self.data.push(value.to_owned()),
            _ => {}
        }
    }

    fn flush(&mut self) -> Option<ServerEvent> {
        let name = self
            .event_name
            .take()
            .unwrap_or_else(|| "message".to_owned());
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(ServerEvent { name, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut EventStreamParser, text: &str) -> Vec<ServerEvent> {
        parser.feed(text.as_bytes())
    }

    #[test]
    fn parses_a_named_event() {
        let mut parser = EventStreamParser::new();
        let events = feed_all(
            &mut parser,
            "event: update\ndata: {\"event\":\"clear\"}\n\n",
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "update");
        assert_eq!(events[0].data, "{\"event\":\"clear\"}");
    }

    #[test]
    fn reassembles_events_split_across_chunks() {
        let mut parser = EventStreamParser::new();

        assert!(parser.feed(b"event: upd").is_empty());
        assert!(parser.feed(b"ate\ndata: x").is_empty());
        let events = parser.feed(b"y\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "update");
        assert_eq!(events[0].data, "xy");
    }

    #[test]
    fn joins_multi_line_data() {
        let mut parser = EventStreamParser::new();
        let events = feed_all(&mut parser, "data: one\ndata: two\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "message");
        assert_eq!(events[0].data, "one\ntwo");
    }

    #[test]
    fn skips_comments_and_unknown_fields() {
        let mut parser = EventStreamParser::new();
        let events = feed_all(
            &mut parser,
            ": keep-alive\nid: 42\nretry: 100\nevent: update\ndata: d\n\n",
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "update");
        assert_eq!(events[0].data, "d");
    }

    #[test]
    fn blank_line_without_data_dispatches_nothing() {
        let mut parser = EventStreamParser::new();
        assert!(feed_all(&mut parser, "event: update\n\n").is_empty());
        // The event name does not leak into the next event
        let events = feed_all(&mut parser, "data: d\n\n");
        assert_eq!(events[0].name, "message");
    }

    #[test]
    fn handles_crlf_line_endings() {
        let mut parser = EventStreamParser::new();
        let events = feed_all(&mut parser, "event: update\r\ndata: d\r\n\r\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "update");
        assert_eq!(events[0].data, "d");
    }

    #[test]
    fn two_events_in_one_chunk() {
        let mut parser = EventStreamParser::new();
        let events = feed_all(&mut parser, "data: a\n\ndata: b\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "a");
        assert_eq!(events[1].data, "b");
    }
}
