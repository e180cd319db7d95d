//! Capacity thresholds and crossing evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A capacity mark expressed as a whole percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(u8);

impl Threshold {
    pub const QUARTER: Threshold = Threshold(25);
    pub const HALF: Threshold = Threshold(50);
    pub const THREE_QUARTERS: Threshold = Threshold(75);
    pub const NINETY: Threshold = Threshold(90);

    /// Returns the percentage value.
    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Number of members needed to meet this threshold: `capacity * pct / 100`,
    /// rounded down.
    pub fn target(&self, capacity: usize) -> usize {
        capacity.saturating_mul(usize::from(self.0)) / 100
    }

    /// Returns true if `count` members meet this threshold.
    pub fn is_met(&self, count: usize, capacity: usize) -> bool {
        count >= self.target(capacity)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// The fixed, ascending set of thresholds a lecture reports on.
///
/// # Reporting policy
///
/// Thresholds are walked in ascending order and the walk stops at the
/// first threshold that is met and has not been reported before. So:
///
/// - each threshold is reported at most once,
/// - at most one threshold is reported per evaluation,
/// - a lower threshold is always reported before a higher one.
///
/// The last point means a single evaluation never skips ahead: if
/// occupancy jumps past several marks at once, only the lowest pending
/// one is reported now and the rest follow on later evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSet {
    thresholds: [Threshold; 4],
}

impl ThresholdSet {
    /// The standard 25/50/75/90 set.
    pub const STANDARD: ThresholdSet = ThresholdSet {
        thresholds: [
            Threshold::QUARTER,
            Threshold::HALF,
            Threshold::THREE_QUARTERS,
            Threshold::NINETY,
        ],
    };

    /// Iterates thresholds in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Threshold> + '_ {
        self.thresholds.iter().copied()
    }

    /// Returns the threshold to report for `count / capacity`, given the
    /// highest threshold already reported.
    ///
    /// Returns `None` when nothing new is met. A zero capacity never
    /// reports anything.
    pub fn evaluate(
        &self,
        count: usize,
        capacity: usize,
        reported: Option<Threshold>,
    ) -> Option<Threshold> {
        if capacity == 0 {
            return None;
        }

        self.iter()
            .filter(|t| reported.map_or(true, |r| *t > r))
            .find(|t| t.is_met(count, capacity))
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self::STANDARD
    }
}
