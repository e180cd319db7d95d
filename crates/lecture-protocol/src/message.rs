//! Status line pushed from the daemon to listeners.

use lecture_core::Occupancy;
use std::fmt;

/// Prefix of every status line.
pub(crate) const STATUS_PREFIX: &str = "Notification: Lecture has ";

/// Suffix of every status line (after `count/capacity`).
pub(crate) const STATUS_SUFFIX: &str = " students registered.";

/// A single status notification.
///
/// Renders (via `Display`) to exactly
/// `Notification: Lecture has {count}/{capacity} students registered.`
/// without the trailing newline; the codec adds the delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    pub count: usize,
    pub capacity: usize,
}

impl StatusLine {
    pub fn new(count: usize, capacity: usize) -> Self {
        Self { count, capacity }
    }

    /// Returns the occupancy this line reports.
    pub fn occupancy(&self) -> Occupancy {
        Occupancy::new(self.count, self.capacity)
    }
}

impl From<Occupancy> for StatusLine {
    fn from(occupancy: Occupancy) -> Self {
        Self::new(occupancy.count, occupancy.capacity)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{STATUS_PREFIX}{}/{}{STATUS_SUFFIX}",
            self.count, self.capacity
        )
    }
}
