use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

use crate::events::TransportTier;

#[derive(Debug)]
pub enum ChatApiError {
    Request(reqwest::Error),
    Status(StatusCode, String),
    Socket(String),
    MalformedFrame(String),
    Serde(JsonError),
    TiersExhausted {
        last_tier: TransportTier,
        message: String,
    },
    Cancelled,
}

/// Error body shape returned by the management API (`{"detail": …}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub detail: Option<serde_json::Value>,
}

impl fmt::Display for ChatApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Socket(message) => write!(f, "socket transport failure: {message}"),
            Self::MalformedFrame(message) => write!(f, "malformed frame: {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::TiersExhausted { last_tier, message } => write!(
                f,
                "all transports exhausted (last tier {}): {message}",
                last_tier.as_str()
            ),
            Self::Cancelled => write!(f, "request was cancelled"),
        }
    }
}

impl std::error::Error for ChatApiError {}

impl From<reqwest::Error> for ChatApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ChatApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract a human-readable message from a non-success response body.
///
/// The server reports failures as `{"detail": "…"}`; anything else falls back
/// to the raw body, then the status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(detail) = payload.detail {
            match detail {
                serde_json::Value::String(message) if !message.trim().is_empty() => {
                    return message;
                }
                serde_json::Value::Null => {}
                other => return other.to_string(),
            }
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::parse_error_message;

    #[test]
    fn parse_error_message_prefers_detail_string() {
        let message = parse_error_message(
            StatusCode::NOT_FOUND,
            r#"{"detail":"Agent with ID 7 not found"}"#,
        );
        assert_eq!(message, "Agent with ID 7 not found");
    }

    #[test]
    fn parse_error_message_keeps_structured_detail_payloads() {
        let message = parse_error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","agent_id"],"msg":"field required"}]}"#,
        );
        assert!(message.contains("field required"));
    }

    #[test]
    fn parse_error_message_falls_back_to_raw_body() {
        let message = parse_error_message(StatusCode::BAD_GATEWAY, "upstream offline");
        assert_eq!(message, "upstream offline");
    }

    #[test]
    fn parse_error_message_falls_back_to_status_reason_for_empty_body() {
        let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(message, "Service Unavailable");
    }
}
