use std::path::PathBuf;

use chat_api::url::{DEFAULT_API_BASE_URL, DEFAULT_WS_BASE_URL};
use chat_api::ChatApiConfig;

pub const API_BASE_URL_ENV_VAR: &str = "AGENTIC_CHAT_API_BASE_URL";
pub const WS_BASE_URL_ENV_VAR: &str = "AGENTIC_CHAT_WS_BASE_URL";
pub const STORAGE_DIR_ENV_VAR: &str = "AGENTIC_CHAT_STORAGE_DIR";

/// Storage directory used when no override is present, relative to the
/// working directory.
pub const DEFAULT_STORAGE_DIR: &str = ".agentic_chat";

/// Application configuration resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub ws_base_url: String,
    pub storage_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ws_base_url: DEFAULT_WS_BASE_URL.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

impl AppConfig {
    /// Reads configuration from the environment, falling back to defaults
    /// for unset or blank variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_base_url: env_or(API_BASE_URL_ENV_VAR, DEFAULT_API_BASE_URL),
            ws_base_url: env_or(WS_BASE_URL_ENV_VAR, DEFAULT_WS_BASE_URL),
            storage_dir: PathBuf::from(env_or(STORAGE_DIR_ENV_VAR, DEFAULT_STORAGE_DIR)),
        }
    }

    /// Transport configuration derived from this application config.
    #[must_use]
    pub fn chat_api_config(&self) -> ChatApiConfig {
        ChatApiConfig::new()
            .with_api_base_url(self.api_base_url.clone())
            .with_ws_base_url(self.ws_base_url.clone())
    }
}

fn env_or(var: &str, default: &str) -> String {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use chat_api::url::{DEFAULT_API_BASE_URL, DEFAULT_WS_BASE_URL};

    #[test]
    fn default_config_points_at_local_endpoints() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.ws_base_url, DEFAULT_WS_BASE_URL);
    }

    #[test]
    fn chat_api_config_carries_both_base_urls() {
        let config = AppConfig {
            api_base_url: "http://example.test/api/v1".to_string(),
            ws_base_url: "ws://example.test".to_string(),
            ..AppConfig::default()
        };

        let transport = config.chat_api_config();
        assert_eq!(transport.api_base_url, "http://example.test/api/v1");
        assert_eq!(transport.ws_base_url, "ws://example.test");
    }
}
