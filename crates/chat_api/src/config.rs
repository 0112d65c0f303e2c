use std::time::Duration;

use crate::url::{DEFAULT_API_BASE_URL, DEFAULT_WS_BASE_URL};

/// Transport configuration for chat API requests.
#[derive(Debug, Clone)]
pub struct ChatApiConfig {
    /// Base URL for REST endpoints (`…/api/v1`).
    pub api_base_url: String,
    /// Base URL for the streaming socket endpoint.
    pub ws_base_url: String,
    /// Optional timeout applied to non-streaming requests.
    ///
    /// Streaming tiers are intentionally left without a deadline; fallback is
    /// driven by explicit transport signals.
    pub timeout: Option<Duration>,
}

impl Default for ChatApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ws_base_url: DEFAULT_WS_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ChatApiConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    #[must_use]
    pub fn with_ws_base_url(mut self, ws_base_url: impl Into<String>) -> Self {
        self.ws_base_url = ws_base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
