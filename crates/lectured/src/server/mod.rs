//! TCP broadcast server for the lecture daemon.
//!
//! The server:
//! - Listens on a TCP endpoint for listener connections
//! - Spawns a ConnectionHandler for each listener
//! - Each handler pushes the current occupancy every tick
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ BroadcastServer │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐  occupancy()  ┌─────────────────┐
//! │ConnectionHandler│──────────────▶│  RegistryHandle │
//! │  (per listener) │               │                 │
//! └───────┬─────────┘               └─────────────────┘
//!         │ status line / tick
//!         ▼
//! ┌─────────────────┐
//! │ Listener Client │
//! └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Accept and connection errors are logged and allow continued operation
//! - Only bind failure is returned to the caller

mod config;
mod connection;

pub use config::{ServerConfig, DEFAULT_BIND_ADDR};
pub use connection::{ConnectionError, ConnectionHandler, DisconnectReason};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::registry::RegistryHandle;

/// TCP broadcast server.
///
/// Owns the accept loop and every connection task it spawns.
pub struct BroadcastServer {
    config: ServerConfig,

    /// Handle to the lecture registry
    registry: RegistryHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for numbering connections in logs
    connection_counter: AtomicU64,
}

impl BroadcastServer {
    /// Creates a new broadcast server.
    pub fn new(
        config: ServerConfig,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        }
    }

    /// Binds the server and runs the accept loop on a background task.
    ///
    /// Returns once the endpoint is bound, so the caller can connect
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the endpoint cannot be bound.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let listener = self.bind().await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind {
                addr: self.config.bind_addr,
                error: e.to_string(),
            })?;

        let cancel_token = self.cancel_token.clone();
        let task = tokio::spawn(async move {
            self.serve(listener).await;
        });

        Ok(ServerHandle {
            local_addr,
            cancel_token,
            task,
        })
    }

    /// Runs the server in the current task.
    ///
    /// Listens for connections until the cancellation token is triggered.
    /// This method does not return until shutdown has completed.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the endpoint cannot be bound.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener).await;
        Ok(())
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| {
                error!(addr = %self.config.bind_addr, error = %e, "Bind failed");
                ServerError::Bind {
                    addr: self.config.bind_addr,
                    error: e.to_string(),
                }
            })?;

        info!(
            addr = %listener.local_addr().unwrap_or(self.config.bind_addr),
            "Broadcast server listening"
        );
        Ok(listener)
    }

    /// Accept loop. Drops the listener and drains every connection task
    /// before returning.
    async fn serve(&self, listener: TcpListener) {
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            // Finished handlers must not count against the limit
                            while let Some(joined) = connections.try_join_next() {
                                if let Err(e) = joined {
                                    warn!(error = %e, "Connection task failed");
                                }
                            }

                            if self.config.max_connections > 0
                                && connections.len() >= self.config.max_connections
                            {
                                warn!(
                                    peer = %peer,
                                    max = self.config.max_connections,
                                    "Connection rejected: limit reached"
                                );
                                drop(stream);
                                continue;
                            }

                            if let Err(e) = stream.set_nodelay(true) {
                                debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
                            }

                            let conn_num = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            let handler = ConnectionHandler::new(
                                stream,
                                peer,
                                self.registry.clone(),
                                self.cancel_token.child_token(),
                                self.config.tick_interval(),
                                self.config.write_timeout(),
                                conn_num,
                            );
                            connections.spawn(handler.run());
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }

                // Reap finished handlers so the set only holds live connections
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Connection task failed");
                    }
                }
            }
        }

        // Stop accepting before waiting on the handlers
        drop(listener);
        self.cleanup(connections).await;
    }

    /// Waits for every connection handler to exit.
    async fn cleanup(&self, mut connections: JoinSet<DisconnectReason>) {
        let open = connections.len();
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Connection task failed during shutdown");
            }
        }

        info!(closed = open, "Server cleanup complete");
    }
}

/// Handle to a server started with [`BroadcastServer::start`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns true once the accept loop and all connections have exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the server and waits for the accept loop and every
    /// connection task to exit.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Task` if the server task panicked.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        self.cancel_token.cancel();
        self.task
            .await
            .map_err(|e| ServerError::Task(e.to_string()))
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: SocketAddr, error: String },

    #[error("Server task failed: {0}")]
    Task(String),
}
