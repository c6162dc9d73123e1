//! Client side of the live change feed (`text/event-stream`).

use crate::http::transport_error;
use reqwest::Response;
use std::collections::VecDeque;
use taskboard_core::TaskId;
use taskboard_core::client::ClientError;

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` parser. Chunks may split lines anywhere.
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

    /// Consumes a chunk of the body and returns every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
            } else {
                self.field(line);
            }
        }
        events
    }

    fn field(&mut self, line: &str) {
        // Comment lines carry the keep-alives.
        if line.starts_with(':') {
            return;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match name {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event,
            data: data.join("\n"),
        })
    }
}

/// A change notification from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    Created(TaskId),
    Updated(TaskId),
    Removed(TaskId),
    /// Changes were missed; reload everything.
    Resync,
}

impl FeedEvent {
    /// Interprets an event, ignoring kinds this client does not know.
    pub fn from_sse(event: &SseEvent) -> Option<Self> {
        let kind = event.event.as_deref()?;
        if kind == "resync" {
            return Some(FeedEvent::Resync);
        }
        let id: TaskId = event.data.parse().ok()?;
        match kind {
            "created" => Some(FeedEvent::Created(id)),
            "updated" => Some(FeedEvent::Updated(id)),
            "removed" => Some(FeedEvent::Removed(id)),
            _ => None,
        }
    }
}

/// An open change feed.
pub struct ChangeFeed {
    response: Response,
    parser: SseParser,
    pending: VecDeque<FeedEvent>,
}

impl ChangeFeed {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            parser: SseParser::new(),
            pending: VecDeque::new(),
        }
    }

    /// Waits for the next change. `None` once the server closes the stream.
    pub async fn next(&mut self) -> Result<Option<FeedEvent>, ClientError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            let Some(chunk) = self.response.chunk().await.map_err(transport_error)? else {
                return Ok(None);
            };
            for event in self.parser.feed(&chunk) {
                match FeedEvent::from_sse(&event) {
                    Some(change) => self.pending.push_back(change),
                    None => tracing::debug!("Ignoring unknown event {:?}", event),
                }
            }
        }
    }
}
