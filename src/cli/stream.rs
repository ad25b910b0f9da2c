//! Stream command implementation

use crate::config::Config;
use crate::feed::{FeedClient, Payload};
use crate::ws::WsConfig;
use anyhow::bail;
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Symbols to stream (e.g. BINANCE:BTCUSDT AAPL); falls back to
    /// feed.symbols from the config file
    pub symbols: Vec<String>,

    /// Print raw feed payloads instead of decoded trades
    #[arg(long)]
    pub raw: bool,
}

impl StreamArgs {
    pub async fn execute(&self, config: &Config, token_override: Option<String>) -> anyhow::Result<()> {
        let symbols = if self.symbols.is_empty() {
            config.feed.symbols.clone()
        } else {
            self.symbols.clone()
        };
        if symbols.is_empty() {
            bail!("no symbols to stream; pass them on the command line or set feed.symbols");
        }

        let Some(token) = config.resolve_token(token_override) else {
            bail!(
                "missing feed access token; pass --token, set feed.token in the config file, \
                 or export {}",
                crate::config::TOKEN_ENV_VAR
            );
        };

        let ws_config = WsConfig::new(&config.feed.ws_url).token(token);
        let client = FeedClient::new(ws_config).sink_capacity(config.feed.sink_capacity);
        let mut handle = client.subscribe(symbols.iter().cloned());

        tracing::info!(symbols = ?symbols, "streaming, Ctrl-C to stop");

        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut seen: u64 = 0;
        let mut was_connected = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let connected = handle.connected();
                    if connected != was_connected {
                        if connected {
                            tracing::info!("feed connected");
                        } else {
                            let error = handle.last_error().await;
                            tracing::warn!(error = ?error, "feed disconnected");
                        }
                        was_connected = connected;
                    }

                    // The sink evicts old entries, so track how many messages
                    // have ever arrived and print only the unseen tail.
                    let total = handle.total_messages().await;
                    if total > seen {
                        let snapshot = handle.messages().await;
                        let unseen = (total - seen) as usize;
                        let start = snapshot.len().saturating_sub(unseen);
                        for message in &snapshot[start..] {
                            self.print_message(message);
                        }
                        seen = total;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        tracing::info!("shutting down");
        handle.close().await;
        Ok(())
    }

    fn print_message(&self, message: &crate::feed::FeedMessage) {
        if self.raw {
            match &message.payload {
                Payload::Json(value) => println!("{}", value),
                Payload::Raw(text) => println!("{}", text),
            }
            return;
        }
        for trade in message.trades() {
            let time = trade
                .time()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| trade.timestamp.to_string());
            println!(
                "{} {} {} x {}",
                time,
                trade.symbol.as_deref().unwrap_or("?"),
                trade.price,
                trade.volume
            );
        }
    }
}
