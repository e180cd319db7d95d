//! Lecture Core - Shared domain types for lecture-notify
//!
//! This crate provides the domain types shared between the daemon
//! (`lectured`) and the listener client (`lecture-listener`).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod lecture;
pub mod participant;
pub mod threshold;

// Re-exports for convenience
pub use error::{DomainError, DomainResult};
pub use lecture::{Lecture, LectureInfo, Occupancy};
pub use participant::{sort_by_age, ParticipantRecord, Role};
pub use threshold::{Threshold, ThresholdSet};
