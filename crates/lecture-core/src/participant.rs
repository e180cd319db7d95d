//! Participant records enrolled in a lecture.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{DomainError, DomainResult};

// ============================================================================
// Role
// ============================================================================

/// Role a participant holds in a lecture.
///
/// Every enrolled record is a student unless the caller says otherwise;
/// any other role is carried as free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular enrolled student
    #[default]
    Student,

    /// Any other role (tutor, auditor, ...)
    Custom(String),
}

impl Role {
    /// Returns the display label for the role.
    pub fn label(&self) -> &str {
        match self {
            Self::Student => "Student",
            Self::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Participant Record
// ============================================================================

/// A person enrolled (or about to be enrolled) in a lecture.
///
/// Equality considers `name` and `age` only; two records that differ
/// only by role are the same participant. Ordering is by age alone and
/// is exposed through [`ParticipantRecord::cmp_by_age`] rather than `Ord`,
/// since records of equal age are not otherwise ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRecord {
    name: String,
    age: u32,
    #[serde(default)]
    role: Role,
}

impl ParticipantRecord {
    /// Creates a student record.
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self::with_role(name, age, Role::Student)
    }

    /// Creates a record with an explicit role.
    pub fn with_role(name: impl Into<String>, age: u32, role: Role) -> Self {
        Self {
            name: name.into(),
            age,
            role,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    /// Checks that the record can be enrolled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFieldValue` if the name is blank.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidFieldValue {
                field: "name".to_string(),
                value: format!("{:?}", self.name),
                expected: "non-empty name".to_string(),
            });
        }
        Ok(())
    }

    /// Compares two records by age only. Ties are not broken by name.
    pub fn cmp_by_age(&self, other: &Self) -> Ordering {
        self.age.cmp(&other.age)
    }

    /// Renders the record as `Name: .., Age: .., Role: ..`.
    pub fn describe(&self) -> String {
        format!("Name: {}, Age: {}, Role: {}", self.name, self.age, self.role)
    }
}

impl PartialEq for ParticipantRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.age == other.age
    }
}

impl Eq for ParticipantRecord {}

impl fmt::Display for ParticipantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Sorts records by age, keeping insertion order among equal ages.
pub fn sort_by_age(records: &mut [ParticipantRecord]) {
    records.sort_by(ParticipantRecord::cmp_by_age);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_role() {
        let a = ParticipantRecord::new("John Doe", 20);
        let b = ParticipantRecord::with_role("John Doe", 20, Role::Custom("Tutor".to_string()));
        assert_eq!(a, b);
        assert_ne!(a, ParticipantRecord::new("John Doe", 21));
        assert_ne!(a, ParticipantRecord::new("Jane Smith", 20));
    }

    #[test]
    fn test_cmp_by_age() {
        let young = ParticipantRecord::new("Zed", 19);
        let old = ParticipantRecord::new("Amy", 30);
        assert_eq!(young.cmp_by_age(&old), Ordering::Less);
        assert_eq!(old.cmp_by_age(&young), Ordering::Greater);
        // Same age, different names: equal under the age comparator
        let other = ParticipantRecord::new("Bob", 19);
        assert_eq!(young.cmp_by_age(&other), Ordering::Equal);
    }

    #[test]
    fn test_sort_by_age_is_stable() {
        let mut records = vec![
            ParticipantRecord::new("Jane Smith", 22),
            ParticipantRecord::new("John Doe", 20),
            ParticipantRecord::new("Ann Lee", 22),
        ];
        sort_by_age(&mut records);
        let names: Vec<&str> = records.iter().map(ParticipantRecord::name).collect();
        assert_eq!(names, vec!["John Doe", "Jane Smith", "Ann Lee"]);
    }

    #[test]
    fn test_describe() {
        let record = ParticipantRecord::new("John Doe", 20);
        assert_eq!(record.describe(), "Name: John Doe, Age: 20, Role: Student");
        assert_eq!(record.to_string(), record.describe());
    }

    #[test]
    fn test_setters() {
        let mut record = ParticipantRecord::new("John Doe", 20);
        record.set_name("Johnny Doe");
        record.set_age(21);
        assert_eq!(record.name(), "Johnny Doe");
        assert_eq!(record.age(), 21);
        assert_eq!(record.role(), &Role::Student);
    }

    #[test]
    fn test_validate_blank_name() {
        assert!(ParticipantRecord::new("  ", 20).validate().is_err());
        assert!(ParticipantRecord::new("Ann", 20).validate().is_ok());
    }

    #[test]
    fn test_role_label() {
        assert_eq!(Role::Student.to_string(), "Student");
        assert_eq!(Role::Custom("Tutor".to_string()).label(), "Tutor");
    }

    #[test]
    fn test_role_defaults_when_missing_from_json() {
        let record: ParticipantRecord =
            serde_json::from_str(r#"{"name":"Jane Smith","age":22}"#).unwrap();
        assert_eq!(record.role(), &Role::Student);
    }
}
