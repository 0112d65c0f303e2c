//! Transport-only chat API client primitives.
//!
//! This crate owns request payloads, wire decoding, and the tiered fallback
//! negotiation for one chat turn: a persistent socket is tried first, then a
//! chunked HTTP stream, then a single-shot request. It intentionally contains
//! no persistence and no UI coupling; callers observe a normalized stream
//! event surface regardless of which tier ends up serving the turn.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod negotiator;
pub mod payload;
pub mod rest;
pub mod socket;
pub mod sse;
pub mod url;

pub use client::ChatApiClient;
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use events::{StreamEvent, TransportTier};
pub use negotiator::{negotiate_turn, CancelSignal, TierTransport};
pub use payload::{ApiMessage, ApiRole, ChatRequest, ChatResponse};
pub use rest::{Agent, AgentDraft, ModelInfo, Tool, ToolDraft, ToolType};
pub use sse::SseStreamParser;
