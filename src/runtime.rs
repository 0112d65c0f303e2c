use chat_api::{
    negotiate_turn, CancelSignal, ChatApiError, ChatRequest, StreamEvent, TierTransport,
    TransportTier,
};

use crate::app::ChatApp;

/// Outcome of one driven turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The send was rejected before any network activity.
    Rejected,
    /// The turn finished and the reply (if any) was committed.
    Completed { tier: TransportTier },
    /// The caller cancelled mid-flight; nothing was committed.
    Cancelled,
    /// Every tier failed; a visible error message was committed.
    Failed { message: String },
}

/// Drives one full chat turn end to end.
///
/// Validates and records the user message, negotiates the transport tiers,
/// feeds deltas into the live preview (surfaced through `on_preview`), and
/// leaves the app with exactly one committed assistant message (the reply or
/// a visible error) unless the turn was rejected or cancelled.
pub async fn run_turn<T, F>(
    app: &mut ChatApp,
    transport: &T,
    input: &str,
    cancel: Option<&CancelSignal>,
    mut on_preview: F,
) -> TurnOutcome
where
    T: TierTransport + ?Sized,
    F: FnMut(&str) + Send,
{
    let Some(turn) = app.begin_turn(input) else {
        return TurnOutcome::Rejected;
    };
    let request = ChatRequest::new(turn.agent_id, turn.messages);

    let result = negotiate_turn(transport, &request, cancel, &mut |event| match event {
        StreamEvent::Delta(text) => {
            app.apply_delta(&text);
            if let Some(preview) = app.streaming_preview() {
                on_preview(preview);
            }
        }
        StreamEvent::Done => app.complete_turn(),
        StreamEvent::TransportError(_) => {}
    })
    .await;

    match result {
        Ok(tier) => TurnOutcome::Completed { tier },
        Err(ChatApiError::Cancelled) => {
            app.cancel_turn();
            TurnOutcome::Cancelled
        }
        Err(error) => {
            let message = error.to_string();
            app.fail_turn(&message);
            TurnOutcome::Failed { message }
        }
    }
}
