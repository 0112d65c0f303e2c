/// Uniform stream event surfaced by every transport tier.
///
/// The negotiator consumes `TransportError` internally to drive fallback;
/// turn callers only ever observe `Delta` and `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental fragment of assistant-generated text.
    Delta(String),
    /// Normal end of the turn; no further deltas will arrive.
    Done,
    /// The live tier failed; carries the transport's own description.
    TransportError(String),
}

impl StreamEvent {
    /// Returns true when this event ends the transport attempt.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::TransportError(_))
    }
}

/// Transport strategy for one turn, in strict priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportTier {
    Socket,
    ChunkedStream,
    SingleShot,
}

impl TransportTier {
    /// The tier attempted after this one fails, if any.
    #[must_use]
    pub fn fallback(self) -> Option<Self> {
        match self {
            Self::Socket => Some(Self::ChunkedStream),
            Self::ChunkedStream => Some(Self::SingleShot),
            Self::SingleShot => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Socket => "socket",
            Self::ChunkedStream => "chunked-stream",
            Self::SingleShot => "single-shot",
        }
    }
}
