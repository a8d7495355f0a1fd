use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a student (a member of the proposing population).
///
/// Students are numbered `0..n` in the order their preference lists were
/// supplied. The identifier space is distinct from [`InstitutionId`] even
/// though both wrap a `usize`.
///
/// # Examples
///
/// ```
/// use stable_matching::core::agent::StudentId;
///
/// let alice = StudentId::new(0);
/// let bob = StudentId::new(1);
/// assert_ne!(alice, bob);
/// assert!(alice < bob);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(usize);

impl StudentId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of this student in the student preference table.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl From<usize> for StudentId {
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

/// Identifier of an institution (a member of the receiving population).
///
/// ```
/// use stable_matching::core::agent::InstitutionId;
///
/// assert_eq!(format!("{}", InstitutionId::new(3)), "I3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstitutionId(usize);

impl InstitutionId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of this institution in the institution preference table.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for InstitutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.0)
    }
}

impl From<usize> for InstitutionId {
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

/// One of the two populations being matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The proposing side.
    Students,
    /// The receiving side.
    Institutions,
}

impl Side {
    /// The population this side ranks.
    pub fn opposite(self) -> Self {
        match self {
            Side::Students => Side::Institutions,
            Side::Institutions => Side::Students,
        }
    }

    /// Singular noun used in messages.
    pub fn noun(self) -> &'static str {
        match self {
            Side::Students => "student",
            Side::Institutions => "institution",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Students => write!(f, "students"),
            Side::Institutions => write!(f, "institutions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_equality() {
        let a = StudentId::new(2);
        let b = StudentId::from(2);
        let c = StudentId::new(3);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_agent_display() {
        assert_eq!(format!("{}", StudentId::new(7)), "S7");
        assert_eq!(format!("{}", InstitutionId::new(0)), "I0");
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Students.opposite(), Side::Institutions);
        assert_eq!(Side::Institutions.opposite(), Side::Students);
        assert_eq!(Side::Institutions.noun(), "institution");
    }

    #[test]
    fn test_ids_serialize_as_numbers() {
        let json = serde_json::to_string(&(StudentId::new(4), InstitutionId::new(9))).unwrap();
        assert_eq!(json, "[4,9]");
    }
}
