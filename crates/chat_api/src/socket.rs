use serde::Deserialize;

use crate::error::ChatApiError;
use crate::events::StreamEvent;

/// Inbound socket frame, dispatched on the wire `type` tag.
///
/// The server sends zero or more `chunk` frames followed by exactly one
/// terminal `done` or `error` frame. Anything else on the wire is a decode
/// failure and ends the tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SocketFrame {
    Chunk {
        content: String,
    },
    Done,
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

/// Decode one text frame from the socket.
pub fn decode_frame(text: &str) -> Result<SocketFrame, ChatApiError> {
    serde_json::from_str(text)
        .map_err(|error| ChatApiError::MalformedFrame(format!("socket frame: {error}")))
}

/// Map a decoded frame onto the uniform stream event surface.
#[must_use]
pub fn frame_event(frame: SocketFrame) -> StreamEvent {
    match frame {
        SocketFrame::Chunk { content } => StreamEvent::Delta(content),
        SocketFrame::Done => StreamEvent::Done,
        SocketFrame::Error { message } => StreamEvent::TransportError(
            message.unwrap_or_else(|| "socket reported an unspecified error".to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_frame, frame_event, SocketFrame};
    use crate::events::StreamEvent;

    #[test]
    fn decode_chunk_frame_carries_content() {
        let frame = decode_frame(r#"{"type":"chunk","content":"Hel"}"#).expect("chunk decodes");
        assert_eq!(
            frame,
            SocketFrame::Chunk {
                content: "Hel".to_string()
            }
        );
        assert_eq!(frame_event(frame), StreamEvent::Delta("Hel".to_string()));
    }

    #[test]
    fn decode_done_frame_is_terminal() {
        let frame = decode_frame(r#"{"type":"done"}"#).expect("done decodes");
        assert_eq!(frame_event(frame), StreamEvent::Done);
    }

    #[test]
    fn decode_error_frame_keeps_server_message() {
        let frame = decode_frame(r#"{"type":"error","message":"model offline"}"#)
            .expect("error decodes");
        assert_eq!(
            frame_event(frame),
            StreamEvent::TransportError("model offline".to_string())
        );
    }

    #[test]
    fn error_frame_without_message_gets_a_fallback_description() {
        let frame = decode_frame(r#"{"type":"error"}"#).expect("bare error decodes");
        assert!(matches!(
            frame_event(frame),
            StreamEvent::TransportError(message) if !message.is_empty()
        ));
    }

    #[test]
    fn unknown_frame_type_is_a_decode_failure() {
        assert!(decode_frame(r#"{"type":"status","content":"x"}"#).is_err());
    }

    #[test]
    fn malformed_payload_is_a_decode_failure() {
        assert!(decode_frame("not json").is_err());
        assert!(decode_frame(r#"{"content":"missing tag"}"#).is_err());
    }
}
