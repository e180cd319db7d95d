//! Listener connection client.
//!
//! This module provides the `ListenerClient` which handles:
//! - Connecting to the daemon's TCP endpoint, optionally with exponential backoff
//! - Reading newline-framed status lines
//! - Forwarding each line to the caller as a [`Notification`]
//!
//! **Panic-Free Policy:** No `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` outside tests.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::codec::{Framed, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lecture_protocol::{line_codec, StatusLine};

use crate::error::{ClientError, Result};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a listener client.
///
/// # Example
///
/// ```rust
/// use lecture_listener::ListenerConfig;
/// use std::time::Duration;
///
/// let config = ListenerConfig {
///     max_attempts: 5,
///     retry_initial_delay: Duration::from_millis(200),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Daemon endpoint.
    pub addr: SocketAddr,

    /// Limit for a single connect attempt.
    pub connect_timeout: Duration,

    /// The connection is dropped if no line arrives for this long.
    pub read_timeout: Duration,

    /// Total connect attempts; values below 1 are treated as 1.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub retry_initial_delay: Duration,

    /// Maximum delay between attempts.
    pub retry_max_delay: Duration,

    /// Multiplier for exponential backoff (e.g., 2.0 doubles delay each retry).
    pub retry_multiplier: f64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            max_attempts: 1,
            retry_initial_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            retry_multiplier: 2.0,
        }
    }
}

impl ListenerConfig {
    /// Delay to wait after an attempt that waited `delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        let next_ms = (delay.as_millis() as f64 * self.retry_multiplier) as u64;
        Duration::from_millis(next_ms).min(self.retry_max_delay)
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// One line received from the daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Name of the listener that received it
    pub listener: String,

    /// The line as received, without the delimiter
    pub text: String,

    /// Parsed status, when the line is a well-formed status line
    pub status: Option<StatusLine>,

    pub received_at: DateTime<Utc>,
}

/// Why a receive loop ended.
#[derive(Debug)]
pub enum ListenerExit {
    /// `stop()` or the shared cancellation token
    Stopped,
    /// The daemon closed the connection
    ServerClosed,
    /// Nothing arrived within the read timeout
    IdleTimeout,
    /// Read failure
    Error(ClientError),
}

// ============================================================================
// Listener Client
// ============================================================================

/// Client that receives status lines from the daemon.
///
/// # Connection Lifecycle
///
/// 1. [`connect`](Self::connect) dials the endpoint, retrying with
///    exponential backoff up to `max_attempts`
/// 2. A receive task is spawned and a [`ListenerHandle`] returned
/// 3. Every line is forwarded on `event_tx`
/// 4. The task exits on stop, EOF, read error, or idle timeout, closing
///    the socket
pub struct ListenerClient {
    name: String,
    config: ListenerConfig,

    /// Channel to deliver notifications to the caller.
    event_tx: mpsc::UnboundedSender<Notification>,

    cancel_token: CancellationToken,
}

impl ListenerClient {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        config: ListenerConfig,
        event_tx: mpsc::UnboundedSender<Notification>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            event_tx,
            cancel_token,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connects and spawns the receive loop.
    ///
    /// # Errors
    ///
    /// - `ClientError::Connect` / `ClientError::ConnectTimeout` once every
    ///   attempt has failed
    /// - `ClientError::Cancelled` if cancelled while waiting to retry
    pub async fn connect(self) -> Result<ListenerHandle> {
        let stream = self.connect_with_retry().await?;
        info!(listener = %self.name, addr = %self.config.addr, "Listener connected");

        let name = self.name.clone();
        let cancel_token = self.cancel_token.clone();
        let task = tokio::spawn(async move { self.receive(stream).await });

        Ok(ListenerHandle {
            name,
            cancel_token,
            task,
        })
    }

    async fn connect_with_retry(&self) -> Result<TcpStream> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut delay = self.config.retry_initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt = attempt.saturating_add(1);

            debug!(
                listener = %self.name,
                attempt,
                addr = %self.config.addr,
                "Attempting to connect"
            );

            let err = match self.connect_once().await {
                Ok(stream) => return Ok(stream),
                Err(e) => e,
            };

            if attempt >= max_attempts || !err.is_retryable() {
                warn!(listener = %self.name, attempt, error = %err, "Giving up on connect");
                return Err(err);
            }
            debug!(listener = %self.name, attempt, error = %err, "Connect attempt failed");

            tokio::select! {
                _ = sleep(delay) => {
                    delay = self.config.next_delay(delay);
                }
                _ = self.cancel_token.cancelled() => {
                    info!(listener = %self.name, "Connection retry cancelled");
                    return Err(ClientError::Cancelled);
                }
            }
        }
    }

    async fn connect_once(&self) -> Result<TcpStream> {
        let addr = self.config.addr;
        match timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ClientError::Connect {
                addr,
                error: e.to_string(),
            }),
            Err(_) => Err(ClientError::ConnectTimeout { addr }),
        }
    }

    /// Receive loop. Owns the socket; dropping it on return closes it.
    async fn receive(self, stream: TcpStream) -> ListenerExit {
        let mut lines = Framed::new(stream, line_codec());

        let exit = loop {
            let next = tokio::select! {
                _ = self.cancel_token.cancelled() => break ListenerExit::Stopped,
                next = timeout(self.config.read_timeout, lines.next()) => next,
            };

            match next {
                Err(_) => break ListenerExit::IdleTimeout,
                Ok(None) => break ListenerExit::ServerClosed,
                Ok(Some(Ok(line))) => self.deliver(line),
                Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                    warn!(listener = %self.name, "Discarded over-long line");
                    // A framed stream ends after any decode error. Rebuilding it
                    // keeps the buffered bytes and the codec's discard state.
                    lines = Framed::from_parts(lines.into_parts());
                }
                Ok(Some(Err(LinesCodecError::Io(e)))) => {
                    break ListenerExit::Error(ClientError::Io(e));
                }
            }
        };

        info!(listener = %self.name, exit = ?exit, "Listener disconnected");
        exit
    }

    fn deliver(&self, line: String) {
        debug!(listener = %self.name, line = %line, "Received line");

        let status = match line.parse::<StatusLine>() {
            Ok(status) => Some(status),
            Err(e) => {
                debug!(listener = %self.name, error = %e, "Line is not a status line");
                None
            }
        };

        // Ignore send errors - the caller may not be consuming notifications
        let _ = self.event_tx.send(Notification {
            listener: self.name.clone(),
            text: line,
            status,
            received_at: Utc::now(),
        });
    }
}

// ============================================================================
// Listener Handle
// ============================================================================

/// Handle to a running receive loop.
pub struct ListenerHandle {
    name: String,
    cancel_token: CancellationToken,
    task: JoinHandle<ListenerExit>,
}

impl ListenerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asks the receive loop to exit. Returns immediately.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the receive loop to exit.
    ///
    /// # Errors
    ///
    /// `ClientError::Task` if the receive task panicked.
    pub async fn wait(self) -> Result<ListenerExit> {
        self.task
            .await
            .map_err(|e| ClientError::Task(e.to_string()))
    }
}
