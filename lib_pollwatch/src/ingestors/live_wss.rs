//! # Live Incident WSS Ingestor
//!
//! WebSocket implementation of [`Connector`]. The feed is receive-only: the
//! client never sends data frames, it only answers the close handshake.
//!
//! Text frames are passed up as-is. Binary frames are accepted when they hold
//! valid UTF-8 and dropped otherwise. Pings and pongs are left to tungstenite.
//! When an idle timeout is configured, a socket that stays silent for longer
//! is reported as [`TransportError::Idle`] so the manager reconnects.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::configs::StreamConfig;
use crate::core::transport::{Connection, Connector, TransportError};

/// Dials the configured live-stream URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    idle_timeout: Option<Duration>,
}

impl WsConnector {
    /// Connector for `url` without an inactivity watchdog.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            idle_timeout: None,
        }
    }

    /// Connector built from a [`StreamConfig`].
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            url: config.url.clone(),
            idle_timeout: config.idle_timeout(),
        }
    }

    /// Treats `timeout` of silence as a dropped connection.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, TransportError> {
        let (ws, response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        log::debug!("WSS handshake complete ({})", response.status());
        Ok(Box::new(WsConnection {
            ws,
            idle_timeout: self.idle_timeout,
        }))
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// An open live-stream socket.
pub struct WsConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    idle_timeout: Option<Duration>,
}

impl WsConnection {
    async fn read(&mut self) -> Option<Result<Message, TransportError>> {
        let next = match self.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.ws.next()).await {
                Ok(next) => next,
                Err(_) => return Some(Err(TransportError::Idle(limit))),
            },
            None => self.ws.next().await,
        };
        next.map(|r| r.map_err(|e| TransportError::Read(e.to_string())))
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.read().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Binary(bin)) => match String::from_utf8(bin.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => log::warn!("Dropping non UTF-8 binary frame ({} bytes)", bin.len()),
                },
                Ok(Message::Close(frame)) => {
                    log::info!("WSS close frame received: {:?}", frame);
                    return None;
                }
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            log::debug!("WSS close handshake failed: {}", e);
        }
    }
}
