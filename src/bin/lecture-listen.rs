//! Lecture Listener - print status lines pushed by `lectured`
//!
//! # Usage
//!
//! ```text
//! lecture-listen --name "John Doe"
//! lecture-listen --name "Jane Smith" --addr 127.0.0.1:9000 --attempts 5
//! ```

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lecture_listener::{ListenerClient, ListenerConfig, ListenerExit};
use lectured::config::parse_addr;
use lectured::server::DEFAULT_BIND_ADDR;

/// Listen for lecture status notifications
#[derive(Parser, Debug)]
#[command(name = "lecture-listen", version, about)]
struct Args {
    /// Name shown next to every received line
    #[arg(short, long)]
    name: String,

    /// Daemon address
    #[arg(short, long, default_value = DEFAULT_BIND_ADDR, value_parser = parse_cli_addr)]
    addr: SocketAddr,

    /// Connect attempts before giving up (exponential backoff between them)
    #[arg(long, default_value_t = 1)]
    attempts: u32,
}

fn parse_cli_addr(raw: &str) -> std::result::Result<SocketAddr, String> {
    parse_addr(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("lecture_listener=info".parse()?)
                .add_directive("lecture_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = ListenerConfig {
        addr: args.addr,
        max_attempts: args.attempts,
        ..Default::default()
    };

    let cancel_token = CancellationToken::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let handle = ListenerClient::new(&args.name, config, event_tx, cancel_token.clone())
        .connect()
        .await
        .with_context(|| format!("{} could not connect to {}", args.name, args.addr))?;

    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C");
        }
        ctrl_c_token.cancel();
    });

    // Ends once the receive loop drops its sender
    while let Some(notification) = event_rx.recv().await {
        println!("{} received: {}", notification.listener, notification.text);
    }

    match handle.wait().await? {
        ListenerExit::Stopped => info!("Listener stopped"),
        ListenerExit::ServerClosed => println!("Server closed the connection"),
        ListenerExit::IdleTimeout => println!("No notifications received, disconnecting"),
        ListenerExit::Error(e) => return Err(e).context("Connection failed"),
    }

    Ok(())
}
