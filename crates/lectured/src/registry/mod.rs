//! Lecture registry using the Actor pattern.
//!
//! The registry is the single owner of the lecture roster. It receives
//! commands via a tokio mpsc channel, and every read and write of the
//! roster goes through that channel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ Enroll callers  │────▶│  RegistryActor  │────▶│ Broadcast Channel│
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!         ▲                       │                       │
//!         │   RegistryCommand     │   RegistryEvent       │
//!         │   (mpsc channel)      │   (broadcast)         │
//! ┌─────────────────┐             ▼                       ▼
//! │ Delivery loops  │          Lecture            threshold / enroll
//! │ (GetOccupancy)  │       (members, cap)           subscribers
//! └─────────────────┘
//! ```

use tokio::sync::{broadcast, mpsc};

use lecture_core::Lecture;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{Enrollment, RegistryCommand, RegistryError, RegistryEvent};
pub use handle::RegistryHandle;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 100;

/// Spawn the registry actor for `lecture` and return a handle for interaction.
///
/// The actor stops once every handle has been dropped.
///
/// # Example
///
/// ```no_run
/// use lecture_core::{Lecture, ParticipantRecord};
/// use lectured::registry::spawn_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry(Lecture::new("C++ Programming", "", 10));
///     let _ = handle.enroll(ParticipantRecord::new("John Doe", 20)).await;
/// }
/// ```
pub fn spawn_registry(lecture: Lecture) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = RegistryActor::new(cmd_rx, lecture, event_tx.clone());
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx, event_tx)
}
