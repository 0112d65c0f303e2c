use std::sync::{atomic::AtomicBool, Arc};

use async_trait::async_trait;
use log::{debug, warn};

use crate::error::ChatApiError;
use crate::events::{StreamEvent, TransportTier};
use crate::payload::ChatRequest;

/// Shared cancellation flag for one in-flight turn.
pub type CancelSignal = Arc<AtomicBool>;

/// The three transport attempts available to one turn.
///
/// Streaming tiers deliver deltas through `on_event` and return `Ok` once the
/// wire-level terminal marker arrives; any other outcome is a tier failure.
/// Implementations release their transport resource before returning.
#[async_trait]
pub trait TierTransport {
    /// Tier 1: persistent bidirectional socket.
    async fn stream_socket(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), ChatApiError>;

    /// Tier 2: chunked HTTP stream, read incrementally.
    async fn stream_chunked(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), ChatApiError>;

    /// Tier 3: single request/response; the whole reply arrives at once.
    async fn single_shot(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<String, ChatApiError>;
}

/// Drive one chat turn through the tier fallback state machine.
///
/// Tiers are attempted in strict priority order (socket, chunked stream,
/// single shot), each at most once, advancing only when the live tier fails.
/// Deltas are forwarded in arrival order and exactly one `Done` is emitted on
/// success, after the winning tier finishes. Cancellation aborts the whole
/// negotiation instead of falling back, and suppresses further events.
///
/// Returns the tier that served the turn, or `TiersExhausted` carrying the
/// final tier's failure once no fallback remains.
pub async fn negotiate_turn<T>(
    transport: &T,
    request: &ChatRequest,
    cancel: Option<&CancelSignal>,
    on_event: &mut (dyn FnMut(StreamEvent) + Send),
) -> Result<TransportTier, ChatApiError>
where
    T: TierTransport + ?Sized,
{
    let mut tier = TransportTier::Socket;

    loop {
        debug!("attempting {} transport", tier.as_str());

        let outcome = attempt_tier(transport, tier, request, cancel, on_event).await;
        match outcome {
            Ok(()) => {
                on_event(StreamEvent::Done);
                return Ok(tier);
            }
            Err(ChatApiError::Cancelled) => return Err(ChatApiError::Cancelled),
            Err(error) => match tier.fallback() {
                Some(next) => {
                    warn!(
                        "{} transport failed, falling back to {}: {error}",
                        tier.as_str(),
                        next.as_str()
                    );
                    tier = next;
                }
                None => {
                    return Err(ChatApiError::TiersExhausted {
                        last_tier: tier,
                        message: error.to_string(),
                    })
                }
            },
        }
    }
}

async fn attempt_tier<T>(
    transport: &T,
    tier: TransportTier,
    request: &ChatRequest,
    cancel: Option<&CancelSignal>,
    on_event: &mut (dyn FnMut(StreamEvent) + Send),
) -> Result<(), ChatApiError>
where
    T: TierTransport + ?Sized,
{
    match tier {
        TransportTier::Socket => {
            transport
                .stream_socket(&request.with_stream(true), cancel, on_event)
                .await
        }
        TransportTier::ChunkedStream => {
            transport
                .stream_chunked(&request.with_stream(true), cancel, on_event)
                .await
        }
        TransportTier::SingleShot => {
            let response = transport
                .single_shot(&request.with_stream(false), cancel)
                .await?;
            if !response.is_empty() {
                on_event(StreamEvent::Delta(response));
            }
            Ok(())
        }
    }
}
