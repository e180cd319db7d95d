//! Lecture Listener - client side of the status broadcast
//!
//! A listener connects to the daemon's TCP endpoint and surfaces every
//! pushed status line as a [`Notification`] on an mpsc channel.
//!
//! ```rust,ignore
//! use lecture_listener::{ListenerClient, ListenerConfig};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let client = ListenerClient::new("John Doe", ListenerConfig::default(), tx, CancellationToken::new());
//! let handle = client.connect().await?;
//!
//! while let Some(notification) = rx.recv().await {
//!     println!("{}", notification.text);
//! }
//! handle.stop();
//! ```
//!
//! **Panic-Free Policy:** No `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` outside tests.

pub mod client;
pub mod error;

pub use client::{ListenerClient, ListenerConfig, ListenerExit, ListenerHandle, Notification};
pub use error::{ClientError, Result};
