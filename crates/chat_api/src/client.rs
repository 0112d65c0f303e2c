use std::future::Future;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::debug;
use reqwest::{Client, Response};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ChatApiConfig;
use crate::error::{parse_error_message, ChatApiError};
use crate::events::StreamEvent;
use crate::negotiator::{CancelSignal, TierTransport};
use crate::payload::{ChatRequest, ChatResponse};
use crate::socket::{decode_frame, frame_event};
use crate::sse::SseStreamParser;
use crate::url::{chat_socket_url, chat_stream_url, chat_url};

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// HTTP and socket client for the chat and management endpoints.
///
/// One instance is shared across turns; each streaming call owns its own
/// connection and releases it when the attempt ends.
#[derive(Debug)]
pub struct ChatApiClient {
    pub(crate) http: Client,
    pub(crate) config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;

        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    /// One-shot chat completion.
    ///
    /// The caller is responsible for sending a `stream:false` payload; the
    /// whole reply arrives in a single response body.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<ChatResponse, ChatApiError> {
        let send = self
            .http
            .post(chat_url(&self.config.api_base_url))
            .json(request)
            .send();
        let response = await_or_cancel(send, cancel)
            .await?
            .map_err(ChatApiError::from)?;
        let response = require_success(response).await?;

        let parsed = await_or_cancel(response.json::<ChatResponse>(), cancel)
            .await?
            .map_err(ChatApiError::from)?;
        Ok(parsed)
    }

    /// Chunked streaming chat: one POST, body decoded incrementally.
    ///
    /// Deltas are forwarded as they decode; the body is never buffered whole.
    /// Returns `Ok` when the completion sentinel arrives or the body ends
    /// cleanly without one.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), ChatApiError> {
        let send = self
            .http
            .post(chat_stream_url(&self.config.api_base_url))
            .json(request)
            .send();
        let response = await_or_cancel(send, cancel)
            .await?
            .map_err(ChatApiError::from)?;
        let response = require_success(response).await?;

        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancel).await? else {
                return Ok(());
            };
            let chunk = chunk.map_err(ChatApiError::from)?;

            for event in parser.feed(&chunk) {
                match event {
                    StreamEvent::Delta(text) => {
                        if !text.is_empty() {
                            on_event(StreamEvent::Delta(text));
                        }
                    }
                    StreamEvent::Done => return Ok(()),
                    StreamEvent::TransportError(message) => {
                        return Err(ChatApiError::MalformedFrame(message))
                    }
                }
            }
        }
    }

    /// Socket streaming chat: connect, send one request frame, read frames
    /// until a terminal frame arrives.
    ///
    /// The connection is closed when the attempt ends, on every path.
    pub async fn chat_socket(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), ChatApiError> {
        let endpoint = chat_socket_url(&self.config.ws_base_url);
        let (mut socket, _) = await_or_cancel(connect_async(endpoint.clone()), cancel)
            .await?
            .map_err(|error| ChatApiError::Socket(format!("connecting {endpoint}: {error}")))?;

        debug!("socket open, sending request frame to {endpoint}");
        let request_frame = serde_json::to_string(request)?;
        if let Err(error) =
            await_or_cancel(socket.send(Message::Text(request_frame.into())), cancel).await?
        {
            let _ = socket.close(None).await;
            return Err(ChatApiError::Socket(format!(
                "sending request frame: {error}"
            )));
        }

        loop {
            let Some(message) = await_or_cancel(socket.next(), cancel).await? else {
                return Err(ChatApiError::Socket(
                    "socket closed before a terminal frame".to_string(),
                ));
            };
            let message = match message {
                Ok(message) => message,
                Err(error) => return Err(ChatApiError::Socket(error.to_string())),
            };

            match message {
                Message::Text(text) => {
                    let frame = match decode_frame(text.as_str()) {
                        Ok(frame) => frame,
                        Err(error) => {
                            let _ = socket.close(None).await;
                            return Err(error);
                        }
                    };

                    match frame_event(frame) {
                        StreamEvent::Delta(content) => {
                            if !content.is_empty() {
                                on_event(StreamEvent::Delta(content));
                            }
                        }
                        StreamEvent::Done => {
                            let _ = socket.close(None).await;
                            return Ok(());
                        }
                        StreamEvent::TransportError(message) => {
                            let _ = socket.close(None).await;
                            return Err(ChatApiError::Socket(message));
                        }
                    }
                }
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => {
                    return Err(ChatApiError::Socket(
                        "socket closed before a terminal frame".to_string(),
                    ))
                }
                other => {
                    let _ = socket.close(None).await;
                    return Err(ChatApiError::MalformedFrame(format!(
                        "unexpected socket message: {other:?}"
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl TierTransport for ChatApiClient {
    async fn stream_socket(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), ChatApiError> {
        self.chat_socket(request, cancel, on_event).await
    }

    async fn stream_chunked(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> Result<(), ChatApiError> {
        self.chat_stream(request, cancel, on_event).await
    }

    async fn single_shot(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancelSignal>,
    ) -> Result<String, ChatApiError> {
        let response = self.chat(request, cancel).await?;
        Ok(response.response)
    }
}

/// Resolve a response into itself on success, or a typed status error
/// carrying the parsed server message.
pub(crate) async fn require_success(response: Response) -> Result<Response, ChatApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ChatApiError::Status(status, parse_error_message(status, &body)))
}

fn is_cancelled(cancel: Option<&CancelSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

/// Await a future while polling the cancellation flag.
///
/// Returns `Cancelled` without delivering the future's output once the flag
/// is set, which is what keeps late events from reaching callbacks.
async fn await_or_cancel<F>(
    future: F,
    cancel: Option<&CancelSignal>,
) -> Result<F::Output, ChatApiError>
where
    F: Future,
{
    if cancel.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancel) {
            return Err(ChatApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancel) {
                return Err(ChatApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
