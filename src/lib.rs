//! tickstream: real-time market data streaming client
//!
//! This library provides the core components for:
//! - A persistent WebSocket connection to a market-data feed
//! - Symbol subscriptions multiplexed over one socket
//! - Automatic reconnection with exponential backoff and resubscription
//! - A bounded, FIFO-evicting buffer of inbound feed messages
//! - Trade-record extraction from feed payloads

pub mod cli;
pub mod config;
pub mod feed;
pub mod telemetry;
pub mod ws;
