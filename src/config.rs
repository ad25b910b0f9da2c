//! Configuration types for tickstream

use serde::Deserialize;

/// Environment variable consulted when no token is configured elsewhere
pub const TOKEN_ENV_VAR: &str = "FINNHUB_TOKEN";

fn default_ws_url() -> String {
    crate::ws::FINNHUB_WS_URL.to_string()
}

fn default_sink_capacity() -> usize {
    crate::feed::DEFAULT_SINK_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Streaming feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Feed base URL
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Access token; may instead come from the CLI or the environment
    #[serde(default)]
    pub token: Option<String>,

    /// Symbols streamed when the CLI is given none
    #[serde(default)]
    pub symbols: Vec<String>,

    /// How many inbound messages each session retains
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            token: None,
            symbols: Vec::new(),
            sink_capacity: default_sink_capacity(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the access token: CLI flag, then config file, then the
    /// `FINNHUB_TOKEN` environment variable
    pub fn resolve_token(&self, cli_override: Option<String>) -> Option<String> {
        self.resolve_token_from(cli_override, std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn resolve_token_from(&self, cli: Option<String>, env: Option<String>) -> Option<String> {
        cli.or_else(|| self.feed.token.clone())
            .or(env)
            .filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [feed]
            ws_url = "wss://ws.finnhub.io"
            token = "secret"
            symbols = ["BINANCE:BTCUSDT", "AAPL"]
            sink_capacity = 200

            [telemetry]
            log_level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.feed.ws_url, "wss://ws.finnhub.io");
        assert_eq!(config.feed.token.as_deref(), Some("secret"));
        assert_eq!(config.feed.symbols.len(), 2);
        assert_eq!(config.feed.sink_capacity, 200);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.feed.ws_url, crate::ws::FINNHUB_WS_URL);
        assert!(config.feed.token.is_none());
        assert!(config.feed.symbols.is_empty());
        assert_eq!(config.feed.sink_capacity, crate::feed::DEFAULT_SINK_CAPACITY);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_resolve_token_precedence() {
        let mut config = Config::default();
        config.feed.token = Some("from-file".to_string());

        let resolved =
            config.resolve_token_from(Some("from-cli".to_string()), Some("from-env".to_string()));
        assert_eq!(resolved.as_deref(), Some("from-cli"));

        let resolved = config.resolve_token_from(None, Some("from-env".to_string()));
        assert_eq!(resolved.as_deref(), Some("from-file"));

        config.feed.token = None;
        let resolved = config.resolve_token_from(None, Some("from-env".to_string()));
        assert_eq!(resolved.as_deref(), Some("from-env"));

        let resolved = config.resolve_token_from(None, None);
        assert!(resolved.is_none());
    }

    #[test]
    fn test_resolve_token_rejects_blank() {
        let config = Config::default();
        let resolved = config.resolve_token_from(Some("   ".to_string()), None);
        assert!(resolved.is_none());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[feed]\ntoken = \"tok\"\nsymbols = [\"BINANCE:ETHUSDT\"]\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.feed.token.as_deref(), Some("tok"));
        assert_eq!(config.feed.symbols, vec!["BINANCE:ETHUSDT"]);
    }
}
