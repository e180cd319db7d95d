//! Connection handler for individual listener connections.
//!
//! Each accepted connection gets its own `ConnectionHandler` that pushes a
//! status line every tick until:
//! - the server is cancelled,
//! - the listener closes its side,
//! - a write fails or times out, or
//! - the registry goes away.
//!
//! None of these are errors for the server; the handler logs and returns.
//!
//! # Backpressure
//!
//! There is none. Lines are pushed on a fixed schedule whether or not the
//! listener reads them. A stalled listener blocks only its own handler,
//! and only for up to the write timeout.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::codec::{FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use lecture_protocol::{line_codec, StatusLine};

use crate::registry::RegistryHandle;

/// Connection handler for a single listener.
///
/// Generic over the two halves of the transport; the server uses the
/// owned halves of a `TcpStream`.
pub struct ConnectionHandler<R = OwnedReadHalf, W = OwnedWriteHalf> {
    /// Read half, only watched for EOF (the protocol is push-only)
    reader: R,

    /// Line-framed write half
    writer: FramedWrite<W, LinesCodec>,

    /// Remote address, for logging
    peer: SocketAddr,

    /// Handle to the lecture registry
    registry: RegistryHandle,

    /// Server-wide cancellation
    cancel_token: CancellationToken,

    tick_interval: Duration,
    write_timeout: Duration,

    /// Sequential number assigned at accept time
    connection_number: u64,
}

impl ConnectionHandler {
    /// Creates a new connection handler for an accepted TCP stream.
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
        tick_interval: Duration,
        write_timeout: Duration,
        connection_number: u64,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        Self::from_halves(
            reader,
            writer,
            peer,
            registry,
            cancel_token,
            tick_interval,
            write_timeout,
            connection_number,
        )
    }
}

impl<R, W> ConnectionHandler<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a handler over an already split transport.
    #[allow(clippy::too_many_arguments)]
    pub fn from_halves(
        reader: R,
        writer: W,
        peer: SocketAddr,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
        tick_interval: Duration,
        write_timeout: Duration,
        connection_number: u64,
    ) -> Self {
        Self {
            reader,
            writer: FramedWrite::new(writer, line_codec()),
            peer,
            registry,
            cancel_token,
            tick_interval,
            write_timeout,
            connection_number,
        }
    }

    /// Runs the delivery loop, then closes the connection.
    ///
    /// Returns the reason the loop ended.
    pub async fn run(mut self) -> DisconnectReason {
        debug!(
            connection = self.connection_number,
            peer = %self.peer,
            "New listener connected"
        );

        let reason = match self.deliver().await {
            Ok(reason) => reason,
            Err(e) => {
                debug!(
                    connection = self.connection_number,
                    error = %e,
                    "Delivery failed"
                );
                DisconnectReason::Error(e)
            }
        };

        // Best-effort flush + shutdown of the write half
        let _ = timeout(self.write_timeout, SinkExt::<String>::close(&mut self.writer)).await;

        info!(
            connection = self.connection_number,
            peer = %self.peer,
            reason = %reason,
            "Listener disconnected"
        );
        reason
    }

    /// Pushes a status line every tick until something ends the loop.
    async fn deliver(&mut self) -> Result<DisconnectReason, ConnectionError> {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut scratch = [0u8; 256];

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    return Ok(DisconnectReason::Shutdown);
                }

                read = self.reader.read(&mut scratch) => {
                    match read {
                        Ok(0) => return Ok(DisconnectReason::PeerClosed),
                        // Inbound bytes carry no meaning; drop them
                        Ok(_) => {}
                        Err(e) => return Err(ConnectionError::Io(e.to_string())),
                    }
                }

                _ = ticker.tick() => {
                    let occupancy = self
                        .registry
                        .occupancy()
                        .await
                        .map_err(|_| ConnectionError::RegistryClosed)?;
                    self.send_status(StatusLine::from(occupancy)).await?;
                }
            }
        }
    }

    /// Writes one framed status line within the write timeout.
    async fn send_status(&mut self, status: StatusLine) -> Result<(), ConnectionError> {
        let line = status.to_string();

        match timeout(self.write_timeout, self.writer.send(line)).await {
            Ok(Ok(())) => {
                debug!(connection = self.connection_number, status = %status, "Sent status");
                Ok(())
            }
            Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
            Err(_) => Err(ConnectionError::WriteTimeout),
        }
    }
}

/// Why a delivery loop ended.
#[derive(Debug)]
pub enum DisconnectReason {
    /// Server cancellation
    Shutdown,
    /// The listener closed its side
    PeerClosed,
    /// Write/read failure or registry shutdown
    Error(ConnectionError),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "server shutdown"),
            Self::PeerClosed => write!(f, "closed by listener"),
            Self::Error(e) => write!(f, "{e}"),
        }
    }
}

/// Errors that end a single connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Registry is no longer running")]
    RegistryClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::StreamExt;
    use lecture_core::Lecture;
    use tokio::io::{duplex, split, DuplexStream, ReadHalf, WriteHalf};
    use tokio_util::codec::FramedRead;

    use crate::registry::spawn_registry;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 9000))
    }

    fn duplex_handler(
        server_end: DuplexStream,
        cancel_token: CancellationToken,
        tick: Duration,
        write_timeout: Duration,
    ) -> ConnectionHandler<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>> {
        let (reader, writer) = split(server_end);
        ConnectionHandler::from_halves(
            reader,
            writer,
            peer(),
            spawn_registry(Lecture::new("C++ Programming", "", 10)),
            cancel_token,
            tick,
            write_timeout,
            0,
        )
    }

    #[tokio::test]
    async fn test_stalled_listener_hits_write_timeout() {
        // Small pipe that the listener side never drains
        let (server_end, _client_end) = duplex(64);
        let handler = duplex_handler(
            server_end,
            CancellationToken::new(),
            Duration::from_millis(5),
            Duration::from_millis(50),
        );

        let reason = tokio::time::timeout(Duration::from_secs(5), handler.run())
            .await
            .expect("handler should give up on the stalled listener");

        assert!(
            matches!(reason, DisconnectReason::Error(ConnectionError::WriteTimeout)),
            "unexpected reason: {reason}"
        );
    }

    #[tokio::test]
    async fn test_status_lines_reach_listener_until_cancelled() {
        let (server_end, client_end) = duplex(1024);
        let cancel_token = CancellationToken::new();
        let handler = duplex_handler(
            server_end,
            cancel_token.clone(),
            Duration::from_millis(10),
            Duration::from_secs(1),
        );
        let task = tokio::spawn(handler.run());

        let mut lines = FramedRead::new(client_end, line_codec());
        let line = tokio::time::timeout(Duration::from_secs(2), lines.next())
            .await
            .expect("timed out waiting for a status line")
            .expect("stream ended")
            .expect("decode failed");
        assert_eq!(line, StatusLine::new(0, 10).to_string());

        cancel_token.cancel();
        let reason = task.await.expect("handler task panicked");
        assert!(matches!(reason, DisconnectReason::Shutdown));
    }

    #[test]
    fn test_connection_error_display() {
        assert_eq!(ConnectionError::WriteTimeout.to_string(), "Write timeout");
        assert!(ConnectionError::Io("broken pipe".to_string())
            .to_string()
            .contains("broken pipe"));
    }

    #[test]
    fn test_disconnect_reason_display() {
        assert_eq!(DisconnectReason::Shutdown.to_string(), "server shutdown");
        assert_eq!(DisconnectReason::PeerClosed.to_string(), "closed by listener");
        assert_eq!(
            DisconnectReason::Error(ConnectionError::RegistryClosed).to_string(),
            "Registry is no longer running"
        );
    }
}
