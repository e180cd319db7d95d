//! Registry actor commands, errors, and events.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//! - `RegistryEvent`: Events published by the registry for subscribers
//!
//! All types are designed for async message passing and follow the panic-free policy.

use chrono::{DateTime, Utc};
use lecture_core::{DomainError, LectureInfo, Occupancy, ParticipantRecord, Threshold};
use thiserror::Error;
use tokio::sync::oneshot;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command uses a oneshot channel for the response, enabling
/// request-response patterns in async code without blocking.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Enroll a participant.
    ///
    /// # Errors
    /// - `RegistryError::CapacityExceeded` if the lecture is full
    /// - `RegistryError::InvalidRecord` if the record fails validation
    Enroll {
        /// The participant to enroll
        record: ParticipantRecord,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<Enrollment, RegistryError>>,
    },

    /// Read the current occupancy.
    GetOccupancy {
        respond_to: oneshot::Sender<Occupancy>,
    },

    /// Read all members in insertion order.
    GetMembers {
        respond_to: oneshot::Sender<Vec<ParticipantRecord>>,
    },

    /// Read the lecture summary.
    GetInfo {
        respond_to: oneshot::Sender<LectureInfo>,
    },
}

/// Outcome of a successful enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrollment {
    /// Occupancy right after the enrollment
    pub occupancy: Occupancy,
    /// Threshold newly crossed by this enrollment, if any
    pub threshold: Option<Threshold>,
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The lecture is full; nothing was added.
    #[error("lecture capacity reached (capacity: {capacity})")]
    CapacityExceeded {
        /// Capacity of the lecture
        capacity: usize,
    },

    /// The record was rejected before enrollment.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

impl From<DomainError> for RegistryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::CapacityExceeded { capacity } => Self::CapacityExceeded { capacity },
            other => Self::InvalidRecord(other.to_string()),
        }
    }
}

// ============================================================================
// Registry Events
// ============================================================================

/// Events published by the registry to subscribers.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A participant was enrolled.
    Enrolled {
        /// Name of the enrolled participant
        name: String,
        /// Occupancy after enrollment
        occupancy: Occupancy,
        at: DateTime<Utc>,
    },

    /// Occupancy crossed a capacity threshold.
    ThresholdReached {
        threshold: Threshold,
        /// Occupancy at the time of the crossing
        occupancy: Occupancy,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::CapacityExceeded { capacity: 10 };
        assert_eq!(err.to_string(), "lecture capacity reached (capacity: 10)");

        let err = RegistryError::ChannelClosed;
        assert_eq!(err.to_string(), "response channel closed");
    }

    #[test]
    fn test_from_domain_error() {
        let err: RegistryError = DomainError::CapacityExceeded { capacity: 3 }.into();
        assert_eq!(err, RegistryError::CapacityExceeded { capacity: 3 });

        let err: RegistryError = DomainError::InvalidFieldValue {
            field: "name".to_string(),
            value: "\"\"".to_string(),
            expected: "non-empty name".to_string(),
        }
        .into();
        assert!(matches!(err, RegistryError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_command_channel_closed_error() {
        let (tx, rx) = oneshot::channel::<Result<Enrollment, RegistryError>>();

        // Drop sender without sending
        drop(tx);

        assert!(rx.await.is_err());
    }
}
