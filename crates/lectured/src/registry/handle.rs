//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending commands
//! to the registry actor and subscribing to registry events.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use tokio::sync::{broadcast, mpsc, oneshot};

use lecture_core::{LectureInfo, Occupancy, ParticipantRecord};

use super::commands::{Enrollment, RegistryCommand, RegistryError, RegistryEvent};

/// Handle for interacting with the registry actor.
///
/// This is a cheap-to-clone handle that can be shared across tasks.
/// All methods are async and communicate with the actor via channels.
///
/// # Usage
///
/// ```ignore
/// let handle = registry_handle.clone();
///
/// match handle.enroll(ParticipantRecord::new("Jane Smith", 22)).await {
///     Ok(enrollment) => println!("now at {}", enrollment.occupancy),
///     Err(RegistryError::CapacityExceeded { .. }) => println!("lecture full"),
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,

    /// Event broadcaster for subscribing to updates
    event_sender: broadcast::Sender<RegistryEvent>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(
        sender: mpsc::Sender<RegistryCommand>,
        event_sender: broadcast::Sender<RegistryEvent>,
    ) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Enroll a participant in the lecture.
    ///
    /// # Errors
    ///
    /// - `RegistryError::CapacityExceeded` if the lecture is full
    /// - `RegistryError::InvalidRecord` if the record fails validation
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn enroll(&self, record: ParticipantRecord) -> Result<Enrollment, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Enroll {
                record,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Read the current occupancy.
    ///
    /// # Errors
    ///
    /// `RegistryError::ChannelClosed` if the actor has shut down.
    pub async fn occupancy(&self) -> Result<Occupancy, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::GetOccupancy { respond_to: tx })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Get all members in insertion order.
    ///
    /// Returns an empty vector if communication with the actor fails.
    pub async fn members(&self) -> Vec<ParticipantRecord> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::GetMembers { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Get the lecture summary.
    ///
    /// Returns `None` if communication with the actor fails.
    pub async fn info(&self) -> Option<LectureInfo> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::GetInfo { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Subscribe to registry events.
    ///
    /// This is a synchronous operation - it doesn't communicate with the actor.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_sender.subscribe()
    }

    /// Check if the actor is still running.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, _event_rx) = broadcast::channel(16);
        let handle = RegistryHandle::new(cmd_tx, event_tx);
        (handle, cmd_rx)
    }

    #[tokio::test]
    async fn test_enroll_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Enroll { record, respond_to }) = rx.recv().await {
                assert_eq!(record.name(), "John Doe");
                let _ = respond_to.send(Ok(Enrollment {
                    occupancy: Occupancy::new(1, 10),
                    threshold: None,
                }));
                return true;
            }
            false
        });

        let result = handle.enroll(ParticipantRecord::new("John Doe", 20)).await;
        assert_eq!(result.unwrap().occupancy, Occupancy::new(1, 10));
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_enroll_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.enroll(ParticipantRecord::new("John Doe", 20)).await;
        assert_eq!(result, Err(RegistryError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_occupancy_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert_eq!(handle.occupancy().await, Err(RegistryError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_members_empty_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(handle.members().await.is_empty());
        assert!(handle.info().await.is_none());
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();
        assert!(handle.is_connected());

        drop(rx);
        // A failed request must not flip the handle back to connected
        let _ = handle.occupancy().await;
        assert!(!handle.is_connected());
    }
}
