/// Default base URL for REST endpoints.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
/// Default base URL for the streaming chat socket.
pub const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8000";

/// Join a base URL and a path, normalizing slashes on the seam.
///
/// An empty or whitespace base falls back to `fallback`.
#[must_use]
pub fn join_url(base: &str, fallback: &'static str, path: &str) -> String {
    let base = if base.trim().is_empty() {
        fallback
    } else {
        base.trim()
    };

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Single-shot chat endpoint for a REST base URL.
#[must_use]
pub fn chat_url(api_base: &str) -> String {
    join_url(api_base, DEFAULT_API_BASE_URL, "chat/")
}

/// Chunked streaming chat endpoint for a REST base URL.
#[must_use]
pub fn chat_stream_url(api_base: &str) -> String {
    join_url(api_base, DEFAULT_API_BASE_URL, "chat/stream")
}

/// Streaming socket endpoint for a socket base URL.
#[must_use]
pub fn chat_socket_url(ws_base: &str) -> String {
    join_url(ws_base, DEFAULT_WS_BASE_URL, "ws/chat")
}
