//! Feed message types
//!
//! Inbound payloads are kept opaque at the transport boundary; the trade
//! projection is the one schema the consumer side actually interprets.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subscribe/unsubscribe control frame sent to the feed
///
/// Wire shape: `{"type":"subscribe","symbol":"BINANCE:BTCUSDT"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlFrame {
    Subscribe { symbol: String },
    Unsubscribe { symbol: String },
}

impl ControlFrame {
    /// Subscribe frame for the given symbol
    pub fn subscribe(symbol: impl Into<String>) -> Self {
        Self::Subscribe {
            symbol: symbol.into(),
        }
    }

    /// Unsubscribe frame for the given symbol
    pub fn unsubscribe(symbol: impl Into<String>) -> Self {
        Self::Unsubscribe {
            symbol: symbol.into(),
        }
    }
}

/// Inbound payload, decoded as far as it will go
///
/// The feed is best-effort: frames that are not JSON are retained verbatim
/// rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Frame parsed as JSON
    Json(serde_json::Value),
    /// Frame that did not parse; kept as-is
    Raw(String),
}

/// A single inbound feed message
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMessage {
    pub payload: Payload,
    /// Local arrival time
    pub received_at: DateTime<Utc>,
}

impl FeedMessage {
    /// Wrap an inbound text frame
    pub fn from_text(text: String) -> Self {
        let payload = match serde_json::from_str(&text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(text),
        };
        Self {
            payload,
            received_at: Utc::now(),
        }
    }

    /// The parsed JSON value, if the frame was JSON
    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.payload {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    /// The verbatim text, if the frame was not JSON
    pub fn raw_text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Json(_) => None,
            Payload::Raw(text) => Some(text),
        }
    }

    /// Extract trade records from a `{"type":"trade","data":[...]}` payload
    ///
    /// Anything else, including malformed trade entries, yields an empty
    /// vector; bad data never surfaces as an error.
    pub fn trades(&self) -> Vec<TradeRecord> {
        let Some(value) = self.json() else {
            return Vec::new();
        };
        if value.get("type").and_then(|t| t.as_str()) != Some("trade") {
            return Vec::new();
        }
        let Some(data) = value.get("data").and_then(|d| d.as_array()) else {
            return Vec::new();
        };
        data.iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect()
    }
}

/// One trade from the feed's trade stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Last price
    #[serde(rename = "p")]
    pub price: Decimal,
    /// Trade volume
    #[serde(rename = "v")]
    pub volume: Decimal,
    /// Trade time, feed-native epoch milliseconds
    #[serde(rename = "t")]
    pub timestamp: i64,
    /// Exchange-qualified symbol; not present on every feed
    #[serde(rename = "s", default)]
    pub symbol: Option<String>,
}

impl TradeRecord {
    /// Trade time as a UTC timestamp, if the epoch value is in range
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_control_frame_subscribe_wire_shape() {
        let frame = ControlFrame::subscribe("BINANCE:BTCUSDT");
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"subscribe","symbol":"BINANCE:BTCUSDT"}"#);
    }

    #[test]
    fn test_control_frame_unsubscribe_wire_shape() {
        let frame = ControlFrame::unsubscribe("AAPL");
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"unsubscribe","symbol":"AAPL"}"#);
    }

    #[test]
    fn test_from_text_json() {
        let msg = FeedMessage::from_text(r#"{"type":"ping"}"#.to_string());
        assert!(msg.json().is_some());
        assert!(msg.raw_text().is_none());
    }

    #[test]
    fn test_from_text_non_json_kept_verbatim() {
        let msg = FeedMessage::from_text("not json at all".to_string());
        assert!(msg.json().is_none());
        assert_eq!(msg.raw_text(), Some("not json at all"));
        assert!(msg.trades().is_empty());
    }

    #[test]
    fn test_trades_extraction() {
        let text = r#"{
            "type": "trade",
            "data": [
                {"p": 42500.5, "v": 0.002, "t": 1704067200123, "s": "BINANCE:BTCUSDT"},
                {"p": 42501.0, "v": 0.01, "t": 1704067200456, "s": "BINANCE:BTCUSDT"}
            ]
        }"#;

        let msg = FeedMessage::from_text(text.to_string());
        let trades = msg.trades();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, dec!(42500.5));
        assert_eq!(trades[0].volume, dec!(0.002));
        assert_eq!(trades[0].symbol.as_deref(), Some("BINANCE:BTCUSDT"));
        assert_eq!(trades[1].timestamp, 1704067200456);
    }

    #[test]
    fn test_trades_symbol_optional() {
        let text = r#"{"type":"trade","data":[{"p":1.5,"v":2,"t":1704067200000}]}"#;
        let msg = FeedMessage::from_text(text.to_string());
        let trades = msg.trades();
        assert_eq!(trades.len(), 1);
        assert!(trades[0].symbol.is_none());
    }

    #[test]
    fn test_trades_ignores_other_message_types() {
        let msg = FeedMessage::from_text(r#"{"type":"ping"}"#.to_string());
        assert!(msg.trades().is_empty());
    }

    #[test]
    fn test_trades_skips_malformed_entries() {
        let text = r#"{"type":"trade","data":[
            {"p": "not a number", "v": 1, "t": 1},
            {"p": 100.0, "v": 1, "t": 1704067200000}
        ]}"#;
        let msg = FeedMessage::from_text(text.to_string());
        let trades = msg.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec!(100.0));
    }

    #[test]
    fn test_trade_time_conversion() {
        let trade = TradeRecord {
            price: dec!(1),
            volume: dec!(1),
            timestamp: 1704067200000,
            symbol: None,
        };
        let time = trade.time().unwrap();
        assert_eq!(time.timestamp(), 1704067200);
    }
}
