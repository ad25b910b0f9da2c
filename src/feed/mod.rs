//! Real-time streaming feed
//!
//! One persistent socket per session, symbol subscriptions multiplexed over
//! it, automatic reconnection with exponential backoff, and a bounded
//! buffer of inbound messages.

mod client;
mod manager;
mod sink;
mod types;

pub use client::{FeedClient, FeedHandle};
pub use sink::{MessageSink, DEFAULT_SINK_CAPACITY};
pub use types::{ControlFrame, FeedMessage, Payload, TradeRecord};
