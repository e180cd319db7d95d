//! Parsing status lines received by listeners.

use std::str::FromStr;
use thiserror::Error;

use crate::message::{StatusLine, STATUS_PREFIX, STATUS_SUFFIX};

/// Errors produced while parsing wire text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed status line: {0}")]
    Malformed(String),
}

impl FromStr for StatusLine {
    type Err = ProtocolError;

    /// Parses `Notification: Lecture has {count}/{capacity} students registered.`
    ///
    /// Surrounding whitespace (including a stray `\r`) is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ProtocolError::Malformed(s.to_string());

        let body = s
            .trim()
            .strip_prefix(STATUS_PREFIX)
            .and_then(|rest| rest.strip_suffix(STATUS_SUFFIX))
            .ok_or_else(malformed)?;

        let (count, capacity) = body.split_once('/').ok_or_else(malformed)?;
        let count = count.parse::<usize>().map_err(|_| malformed())?;
        let capacity = capacity.parse::<usize>().map_err(|_| malformed())?;

        Ok(StatusLine::new(count, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let line: StatusLine = "Notification: Lecture has 3/10 students registered."
            .parse()
            .unwrap();
        assert_eq!(line, StatusLine::new(3, 10));
    }

    #[test]
    fn test_parse_tolerates_crlf() {
        let line: StatusLine = "Notification: Lecture has 0/0 students registered.\r"
            .parse()
            .unwrap();
        assert_eq!(line, StatusLine::new(0, 0));
    }

    #[test]
    fn test_parse_rendered_line() {
        let original = StatusLine::new(42, 100);
        assert_eq!(original.to_string().parse::<StatusLine>(), Ok(original));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("hello".parse::<StatusLine>().is_err());
        assert!("Notification: Lecture has x/10 students registered."
            .parse::<StatusLine>()
            .is_err());
        assert!("Notification: Lecture has 3-10 students registered."
            .parse::<StatusLine>()
            .is_err());
        // Two lines glued together are not one status line
        assert!(
            "Notification: Lecture has 1/10 students registered.Notification: Lecture has 2/10 students registered."
                .parse::<StatusLine>()
                .is_err()
        );
    }
}
