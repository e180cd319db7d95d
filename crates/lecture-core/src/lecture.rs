//! Lecture domain entity: a capacity-bounded roster of participants.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{DomainError, DomainResult};
use crate::participant::ParticipantRecord;
use crate::threshold::{Threshold, ThresholdSet};

// ============================================================================
// Value Objects
// ============================================================================

/// Point-in-time occupancy of a lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    /// Number of enrolled members
    pub count: usize,
    /// Maximum number of members
    pub capacity: usize,
}

impl Occupancy {
    pub fn new(count: usize, capacity: usize) -> Self {
        Self { count, capacity }
    }

    /// Returns true if no more members can be enrolled.
    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    /// Occupancy as a percentage (0.0 for a zero-capacity lecture).
    pub fn percentage(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        (self.count as f64 / self.capacity as f64) * 100.0
    }
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.count, self.capacity)
    }
}

/// Read-only summary of a lecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureInfo {
    pub title: String,
    pub description: String,
    pub occupancy: Occupancy,
}

// ============================================================================
// Lecture Entity
// ============================================================================

/// A lecture with a fixed capacity and an append-only roster.
///
/// Members are kept in insertion order. There is no removal; the roster
/// only grows until it reaches capacity.
#[derive(Debug, Clone)]
pub struct Lecture {
    title: String,
    description: String,
    capacity: usize,
    members: Vec<ParticipantRecord>,
    thresholds: ThresholdSet,
    /// Highest threshold reported so far
    reported: Option<Threshold>,
}

impl Lecture {
    /// Creates an empty lecture.
    pub fn new(title: impl Into<String>, description: impl Into<String>, capacity: usize) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            capacity,
            members: Vec::new(),
            thresholds: ThresholdSet::STANDARD,
            reported: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Members in insertion order.
    pub fn members(&self) -> &[ParticipantRecord] {
        &self.members
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy::new(self.members.len(), self.capacity)
    }

    pub fn info(&self) -> LectureInfo {
        LectureInfo {
            title: self.title.clone(),
            description: self.description.clone(),
            occupancy: self.occupancy(),
        }
    }

    /// Highest threshold reported so far.
    pub fn reported_threshold(&self) -> Option<Threshold> {
        self.reported
    }

    /// Enrolls a participant.
    ///
    /// On success returns the threshold newly crossed by this enrollment,
    /// if any (see [`ThresholdSet`] for the reporting policy).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CapacityExceeded` if the lecture is full, or
    /// `DomainError::InvalidFieldValue` for a record with a blank name. The
    /// roster is left untouched in both cases.
    pub fn enroll(&mut self, record: ParticipantRecord) -> DomainResult<Option<Threshold>> {
        record.validate()?;
        if self.members.len() >= self.capacity {
            return Err(DomainError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        debug!(name = record.name(), lecture = %self.title, "Enrolling participant");
        self.members.push(record);

        let crossed = self
            .thresholds
            .evaluate(self.members.len(), self.capacity, self.reported);
        if crossed.is_some() {
            self.reported = crossed;
        }
        Ok(crossed)
    }
}
