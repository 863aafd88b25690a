//! # Transport Seam
//!
//! The stream manager does not know about sockets. It dials through a
//! [`Connector`] and reads text frames from the [`Connection`] it gets back.
//! The WebSocket implementation lives in `ingestors::live_wss`; tests plug in
//! scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Everything that can go wrong below the manager. None of it reaches listeners.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The handshake failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The socket errored while reading.
    #[error("read failed: {0}")]
    Read(String),

    /// No frame arrived within the watchdog period.
    #[error("no frame received for {0:?}")]
    Idle(Duration),
}

/// One live connection. Receive-only.
#[async_trait]
pub trait Connection: Send {
    /// Next text frame. `None` means the peer closed the connection.
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;

    /// Best-effort close handshake.
    async fn close(&mut self);
}

/// Opens connections to the configured endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Performs the handshake.
    async fn connect(&self) -> Result<Box<dyn Connection>, TransportError>;

    /// Endpoint description for logs.
    fn endpoint(&self) -> String;
}
