//! Lecture Daemon - enrollment registry and broadcast server
//!
//! This crate provides the core infrastructure for the lecture daemon:
//! - `registry` - Registry actor that owns the lecture roster
//! - `server` - TCP server pushing occupancy status lines to listeners
//! - `config` - Daemon configuration (TOML file + environment overrides)
//! - `store` - Roster persistence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       lectured                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │ BroadcastServer │────▶│     RegistryActor           │    │
//! │  │   (TCP socket)  │     │  (roster owner)             │    │
//! │  └────────┬────────┘     └──────────────┬──────────────┘    │
//! │           │                             │                   │
//! │           │ connections                 │ events            │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │ConnectionHandler│     │   broadcast::Sender         │    │
//! │  │ (per listener)  │     │   (threshold / enrollment)  │    │
//! │  └─────────────────┘     └─────────────────────────────┘    │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod registry;
pub mod server;
pub mod store;
