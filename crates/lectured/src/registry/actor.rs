//! Registry actor - owns the lecture and processes commands.
//!
//! The RegistryActor is the single owner of lecture state in the system.
//! It receives commands via an mpsc channel and publishes events via broadcast.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel send failures are ignored, never unwrapped

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use lecture_core::{Lecture, ParticipantRecord};

use super::commands::{Enrollment, RegistryCommand, RegistryError, RegistryEvent};

/// The registry actor - owns all lecture state.
///
/// Commands are processed sequentially in a single task, so every
/// mutation of the roster and every occupancy read is serialized through
/// the same channel. Delivery loops never observe a half-applied
/// enrollment.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// The lecture being tracked
    lecture: Lecture,

    /// Event publisher for enrollment and threshold events
    event_publisher: broadcast::Sender<RegistryEvent>,
}

impl RegistryActor {
    /// Creates a new registry actor.
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        lecture: Lecture,
        event_publisher: broadcast::Sender<RegistryEvent>,
    ) -> Self {
        Self {
            receiver,
            lecture,
            event_publisher,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    pub async fn run(mut self) {
        info!(
            lecture = %self.lecture.title(),
            capacity = self.lecture.capacity(),
            "Registry actor starting"
        );

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            "Registry actor stopped (members: {})",
            self.lecture.members().len()
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Enroll { record, respond_to } => {
                let result = self.handle_enroll(record);
                // Ignore send error - caller may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::GetOccupancy { respond_to } => {
                let _ = respond_to.send(self.lecture.occupancy());
            }
            RegistryCommand::GetMembers { respond_to } => {
                let _ = respond_to.send(self.lecture.members().to_vec());
            }
            RegistryCommand::GetInfo { respond_to } => {
                let _ = respond_to.send(self.lecture.info());
            }
        }
    }

    fn handle_enroll(&mut self, record: ParticipantRecord) -> Result<Enrollment, RegistryError> {
        let name = record.name().to_string();

        let threshold = match self.lecture.enroll(record) {
            Ok(threshold) => threshold,
            Err(e) => {
                warn!(
                    name = %name,
                    occupancy = %self.lecture.occupancy(),
                    error = %e,
                    "Enrollment rejected"
                );
                return Err(e.into());
            }
        };

        let occupancy = self.lecture.occupancy();
        let at = Utc::now();

        info!(
            name = %name,
            occupancy = %occupancy,
            percent = occupancy.percentage(),
            "Participant enrolled"
        );
        let _ = self.event_publisher.send(RegistryEvent::Enrolled {
            name,
            occupancy,
            at,
        });

        if let Some(threshold) = threshold {
            info!(
                threshold = %threshold,
                occupancy = %occupancy,
                "Lecture reached {threshold} of capacity: {occupancy}"
            );
            let _ = self.event_publisher.send(RegistryEvent::ThresholdReached {
                threshold,
                occupancy,
                at,
            });
        } else {
            debug!(occupancy = %occupancy, "No new threshold crossed");
        }

        Ok(Enrollment {
            occupancy,
            threshold,
        })
    }

    /// Returns the number of enrolled members (for testing).
    #[cfg(test)]
    pub fn member_count(&self) -> usize {
        self.lecture.members().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lecture_core::{Occupancy, Threshold};
    use tokio::sync::oneshot;

    fn create_actor(
        capacity: usize,
    ) -> (
        mpsc::Sender<RegistryCommand>,
        RegistryActor,
        broadcast::Receiver<RegistryEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = broadcast::channel(64);
        let lecture = Lecture::new("Rust", "Systems programming", capacity);
        let actor = RegistryActor::new(cmd_rx, lecture, event_tx);
        (cmd_tx, actor, event_rx)
    }

    async fn enroll(actor: &mut RegistryActor, name: &str) -> Result<Enrollment, RegistryError> {
        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::Enroll {
            record: ParticipantRecord::new(name, 20),
            respond_to: tx,
        });
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_enroll_publishes_enrolled_event() {
        let (_, mut actor, mut event_rx) = create_actor(10);

        let enrollment = enroll(&mut actor, "John Doe").await.unwrap();
        assert_eq!(enrollment.occupancy, Occupancy::new(1, 10));
        assert_eq!(enrollment.threshold, None);

        match event_rx.try_recv().unwrap() {
            RegistryEvent::Enrolled { name, occupancy, .. } => {
                assert_eq!(name, "John Doe");
                assert_eq!(occupancy, Occupancy::new(1, 10));
            }
            other => panic!("Expected Enrolled, got {other:?}"),
        }
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_threshold_event_published_once() {
        let (_, mut actor, mut event_rx) = create_actor(10);

        for i in 0..4 {
            enroll(&mut actor, &format!("student-{i}")).await.unwrap();
        }

        let mut thresholds = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            if let RegistryEvent::ThresholdReached { threshold, occupancy, .. } = event {
                thresholds.push((threshold, occupancy.count));
            }
        }
        assert_eq!(thresholds, vec![(Threshold::QUARTER, 2)]);
    }

    #[tokio::test]
    async fn test_capacity_exceeded_leaves_members_unchanged() {
        let (_, mut actor, mut event_rx) = create_actor(2);

        enroll(&mut actor, "a").await.unwrap();
        enroll(&mut actor, "b").await.unwrap();
        while event_rx.try_recv().is_ok() {}

        let result = enroll(&mut actor, "c").await;
        assert_eq!(result, Err(RegistryError::CapacityExceeded { capacity: 2 }));
        assert_eq!(actor.member_count(), 2);

        // Rejections publish nothing
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_get_members_in_insertion_order() {
        let (_, mut actor, _) = create_actor(5);
        enroll(&mut actor, "Jane Smith").await.unwrap();
        enroll(&mut actor, "John Doe").await.unwrap();

        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::GetMembers { respond_to: tx });
        let members = rx.await.unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Jane Smith", "John Doe"]);
    }

    #[tokio::test]
    async fn test_get_info() {
        let (_, mut actor, _) = create_actor(5);
        enroll(&mut actor, "Jane Smith").await.unwrap();

        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::GetInfo { respond_to: tx });
        let info = rx.await.unwrap();
        assert_eq!(info.title, "Rust");
        assert_eq!(info.description, "Systems programming");
        assert_eq!(info.occupancy, Occupancy::new(1, 5));
    }
}
