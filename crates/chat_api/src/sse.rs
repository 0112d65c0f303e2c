use crate::events::StreamEvent;

/// Payload value signaling normal end-of-stream on the chunked tier.
pub const DONE_SENTINEL: &str = "[DONE]";
/// Line prefix carrying event payloads on the chunked tier.
pub const DATA_PREFIX: &str = "data: ";

/// Incremental parser for line-delimited `data: ` event streams.
///
/// Network reads may split or merge event boundaries, so the parser keeps the
/// trailing partial line buffered across `feed` calls. Payloads are forwarded
/// verbatim; whitespace inside a delta is content, not framing.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find('\n') {
            let line = self.buffer[..split].to_string();
            self.buffer.drain(0..=split);

            if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
                if payload == DONE_SENTINEL {
                    events.push(StreamEvent::Done);
                } else {
                    events.push(StreamEvent::Delta(payload.to_string()));
                }
            }
        }

        events
    }

    #[must_use]
    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.is_empty()
    }
}
