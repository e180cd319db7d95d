//! Lecture Daemon - enrollment registry and status broadcast server
//!
//! # Usage
//!
//! ```bash
//! # Serve the configured lecture until SIGINT/SIGTERM
//! lectured serve --addr 127.0.0.1:8080 --roster students.json
//!
//! # Run the two-listener walkthrough
//! lectured demo
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lecture_core::{sort_by_age, Lecture, ParticipantRecord};
use lecture_listener::{ListenerClient, ListenerConfig, ListenerHandle, Notification};
use lectured::config::{parse_addr, DaemonConfig};
use lectured::registry::{spawn_registry, RegistryError, RegistryHandle};
use lectured::server::{BroadcastServer, ServerConfig, DEFAULT_BIND_ADDR};
use lectured::store::{JsonFileStore, RosterStore};

/// Lecture daemon - capacity notifications over TCP
#[derive(Parser, Debug)]
#[command(name = "lectured", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the configured lecture
    Serve {
        /// Config file (default: ~/.config/lecture/config.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to listen on
        #[arg(short, long, value_parser = parse_cli_addr)]
        addr: Option<SocketAddr>,

        /// Roster file loaded on start and saved on exit
        #[arg(short, long)]
        roster: Option<PathBuf>,
    },

    /// Enroll two students with two listeners attached, then save and list the roster
    Demo {
        /// Address to listen on
        #[arg(short, long, default_value = DEFAULT_BIND_ADDR, value_parser = parse_cli_addr)]
        addr: SocketAddr,

        /// Where the roster is saved
        #[arg(short, long, default_value = "students.json")]
        roster: PathBuf,
    },
}

fn parse_cli_addr(raw: &str) -> std::result::Result<SocketAddr, String> {
    parse_addr(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("lectured=info".parse()?)
                .add_directive("lecture_core=info".parse()?)
                .add_directive("lecture_listener=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Serve {
        config: None,
        addr: None,
        roster: None,
    });

    match command {
        Command::Serve {
            config,
            addr,
            roster,
        } => {
            let mut config =
                DaemonConfig::load(config.as_deref()).context("Failed to load configuration")?;
            if let Some(addr) = addr {
                config.server.bind_addr = addr;
            }
            if roster.is_some() {
                config.roster_path = roster;
            }
            serve(config).await
        }
        Command::Demo { addr, roster } => demo(addr, roster).await,
    }
}

async fn serve(config: DaemonConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Lecture daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let registry = spawn_registry(config.lecture.build());
    info!(
        title = %config.lecture.title,
        capacity = config.lecture.capacity,
        "Registry started"
    );

    let store = config.roster_path.as_ref().map(JsonFileStore::new);
    if let Some(store) = &store {
        let records = store.load().context("Failed to load roster")?;
        restore_roster(&registry, records).await;
    }

    let server = BroadcastServer::new(config.server, registry.clone(), cancel_token);
    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    if let Some(store) = &store {
        store
            .save(&registry.members().await)
            .context("Failed to save roster")?;
    }

    info!("Lecture daemon stopped");
    Ok(())
}

/// Re-enrolls saved records. Records that no longer fit are dropped.
async fn restore_roster(registry: &RegistryHandle, records: Vec<ParticipantRecord>) {
    let total = records.len();
    let mut restored = 0usize;

    for record in records {
        let name = record.name().to_string();
        match registry.enroll(record).await {
            Ok(_) => restored += 1,
            Err(e) => warn!(name = %name, error = %e, "Skipping saved record"),
        }
    }

    info!(restored, total, "Roster restored");
}

/// Walkthrough: one capacity-10 lecture, two students listening, both
/// enrolled, roster saved, reloaded and printed by age.
async fn demo(addr: SocketAddr, roster: PathBuf) -> Result<()> {
    let registry = spawn_registry(Lecture::new(
        "C++ Programming",
        "An advanced C++ programming class",
        10,
    ));

    let server = BroadcastServer::new(
        ServerConfig::with_addr(addr),
        registry.clone(),
        CancellationToken::new(),
    )
    .start()
    .await
    .context("Failed to start server")?;
    println!("Server started and listening on {}", server.local_addr());

    let students = vec![
        ParticipantRecord::new("John Doe", 20),
        ParticipantRecord::new("Jane Smith", 22),
    ];

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Notification>();
    let printer = tokio::spawn(async move {
        while let Some(notification) = event_rx.recv().await {
            println!("{} received: {}", notification.listener, notification.text);
        }
    });
    let listener_config = ListenerConfig {
        addr: server.local_addr(),
        ..Default::default()
    };

    let mut listeners: Vec<ListenerHandle> = Vec::new();
    for student in &students {
        let client = ListenerClient::new(
            student.name(),
            listener_config.clone(),
            event_tx.clone(),
            CancellationToken::new(),
        );
        match client.connect().await {
            Ok(handle) => listeners.push(handle),
            Err(e) => eprintln!("Error: {} could not connect: {e}", student.name()),
        }
    }

    for student in &students {
        match registry.enroll(student.clone()).await {
            Ok(enrollment) => {
                if let Some(threshold) = enrollment.threshold {
                    println!(
                        "Lecture reached {threshold} of capacity: {}",
                        enrollment.occupancy
                    );
                }
            }
            Err(RegistryError::CapacityExceeded { .. }) => {
                eprintln!("Error: Lecture capacity reached.");
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    // Let a couple of status lines reach the listeners
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let store = JsonFileStore::new(&roster);
    let members = registry.members().await;
    store.save(&members).context("Failed to save roster")?;

    let mut restored = store.load().context("Failed to reload roster")?;
    if restored == members {
        println!("Restored roster matches the lecture ({} students)", restored.len());
    } else {
        println!("Restored roster differs from the lecture");
    }

    sort_by_age(&mut restored);
    for record in &restored {
        println!("{}", record.describe());
    }

    for listener in &listeners {
        listener.stop();
    }
    for listener in listeners {
        if let Err(e) = listener.wait().await {
            warn!(error = %e, "Listener did not stop cleanly");
        }
    }
    server.shutdown().await.context("Server did not shut down cleanly")?;

    // Every sender is gone once the listeners have exited
    drop(event_tx);
    let _ = printer.await;

    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
