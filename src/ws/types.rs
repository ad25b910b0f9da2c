//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

/// Finnhub real-time trades endpoint
pub const FINNHUB_WS_URL: &str = "wss://ws.finnhub.io";

/// WebSocket feed configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Feed base URL (without query parameters)
    pub url: String,
    /// Access token appended to the connection URI
    pub token: String,
    /// Delay before the first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Maximum delay between reconnection attempts
    pub max_reconnect_delay: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: FINNHUB_WS_URL.to_string(),
            token: String::new(),
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

impl WsConfig {
    /// Create a new config for the given feed base URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the access token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set the maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Whether a usable access token is present
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Build the connection URI with the token as a query parameter
    pub fn connect_url(&self) -> String {
        format!("{}?token={}", self.url, self.token)
    }
}

/// WebSocket transport errors
#[derive(Debug, Clone, Error)]
pub enum WsError {
    /// Connection failed or dropped
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Outbound frame could not be sent
    #[error("send failed: {0}")]
    SendFailed(String),
    /// No access token configured
    #[error("missing feed access token")]
    MissingToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_config_default() {
        let config = WsConfig::default();
        assert_eq!(config.url, FINNHUB_WS_URL);
        assert_eq!(config.initial_reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
        assert!(!config.has_token());
    }

    #[test]
    fn test_ws_config_builder() {
        let config = WsConfig::new("wss://example.com")
            .token("abc123")
            .initial_delay(Duration::from_millis(500))
            .max_delay(Duration::from_secs(10));

        assert_eq!(config.url, "wss://example.com");
        assert_eq!(config.token, "abc123");
        assert_eq!(config.initial_reconnect_delay, Duration::from_millis(500));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_connect_url_embeds_token() {
        let config = WsConfig::new("wss://ws.finnhub.io").token("tok");
        assert_eq!(config.connect_url(), "wss://ws.finnhub.io?token=tok");
    }

    #[test]
    fn test_has_token_rejects_whitespace() {
        let config = WsConfig::default().token("   ");
        assert!(!config.has_token());
    }

    #[test]
    fn test_ws_error_display() {
        let err = WsError::ConnectionFailed("timeout".to_string());
        assert_eq!(err.to_string(), "connection failed: timeout");

        let err = WsError::MissingToken;
        assert_eq!(err.to_string(), "missing feed access token");
    }
}
