//! WebSocket transport abstraction
//!
//! The connection manager drives the socket through the [`Transport`] and
//! [`Connection`] traits so that tests can substitute a scripted endpoint.
//! [`WsTransport`] is the production implementation over tokio-tungstenite.

use super::types::WsError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Factory for live socket connections
#[async_trait]
pub trait Transport: Send {
    /// Open a connection to the given URI
    async fn connect(&mut self, url: &str) -> Result<Box<dyn Connection>, WsError>;
}

/// A single live socket
#[async_trait]
pub trait Connection: Send {
    /// Send a text frame
    async fn send_text(&mut self, text: &str) -> Result<(), WsError>;

    /// Await the next inbound text frame
    ///
    /// Returns `None` once the peer closes the socket. Control frames
    /// (ping/pong) are handled internally and never surface here.
    async fn next_text(&mut self) -> Option<Result<String, WsError>>;

    /// Close the socket, best-effort
    async fn close(&mut self);
}

/// Production transport over tokio-tungstenite
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&mut self, url: &str) -> Result<Box<dyn Connection>, WsError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (write, read) = ws_stream.split();
        Ok(Box::new(WsConnection { write, read }))
    }
}

struct WsConnection {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: &str) -> Result<(), WsError> {
        self.write
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String, WsError>> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Ping(data))) => {
                    // A failed pong means the write half is gone; the read
                    // half will error shortly, so keep going.
                    let _ = self.write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) => return None,
                Some(Ok(_)) => {
                    // The feed is text/JSON only; skip binary and pong frames
                }
                Some(Err(e)) => return Some(Err(WsError::ConnectionFailed(e.to_string()))),
                None => return None,
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.write.send(Message::Close(None)).await;
    }
}
