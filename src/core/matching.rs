use crate::core::agent::{InstitutionId, StudentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors arising when assembling a [`Matching`] from explicit pairs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    #[error("student {student} is outside the population of {count}")]
    StudentOutOfRange { student: StudentId, count: usize },
    #[error("institution {institution} is outside the population of {count}")]
    InstitutionOutOfRange {
        institution: InstitutionId,
        count: usize,
    },
    #[error("student {student} is assigned to both {first} and {second}")]
    StudentAssignedTwice {
        student: StudentId,
        first: InstitutionId,
        second: InstitutionId,
    },
    #[error("institution {institution} holds both {first} and {second}")]
    InstitutionAssignedTwice {
        institution: InstitutionId,
        first: StudentId,
        second: StudentId,
    },
}

/// A one-to-one assignment of students to institutions.
///
/// Either side may have unmatched agents. The mapping is stored in both
/// directions over dense arrays so that `institution_of` and `student_of`
/// are O(1).
///
/// A `Matching` is immutable once built: the engine hands one over when it
/// finishes, and callers build their own with [`Matching::from_pairs`].
///
/// # Examples
///
/// ```
/// use stable_matching::core::agent::{InstitutionId, StudentId};
/// use stable_matching::core::matching::Matching;
///
/// let pairs = [
///     (StudentId::new(0), InstitutionId::new(1)),
///     (StudentId::new(1), InstitutionId::new(0)),
/// ];
/// let m = Matching::from_pairs(2, 2, pairs).unwrap();
/// assert_eq!(m.institution_of(StudentId::new(0)), Some(InstitutionId::new(1)));
/// assert_eq!(m.student_of(InstitutionId::new(1)), Some(StudentId::new(0)));
/// assert!(m.is_perfect());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MatchingRepr", into = "MatchingRepr")]
pub struct Matching {
    by_student: Vec<Option<InstitutionId>>,
    by_institution: Vec<Option<StudentId>>,
}

impl Matching {
    /// A matching in which nobody is assigned.
    pub fn empty(student_count: usize, institution_count: usize) -> Self {
        Self {
            by_student: vec![None; student_count],
            by_institution: vec![None; institution_count],
        }
    }

    /// Assemble a matching, rejecting out-of-range ids and any agent
    /// that appears in more than one pair.
    pub fn from_pairs(
        student_count: usize,
        institution_count: usize,
        pairs: impl IntoIterator<Item = (StudentId, InstitutionId)>,
    ) -> Result<Self, MatchingError> {
        let mut matching = Self::empty(student_count, institution_count);
        for (student, institution) in pairs {
            if student.index() >= student_count {
                return Err(MatchingError::StudentOutOfRange {
                    student,
                    count: student_count,
                });
            }
            if institution.index() >= institution_count {
                return Err(MatchingError::InstitutionOutOfRange {
                    institution,
                    count: institution_count,
                });
            }
            if let Some(first) = matching.by_student[student.index()] {
                return Err(MatchingError::StudentAssignedTwice {
                    student,
                    first,
                    second: institution,
                });
            }
            if let Some(first) = matching.by_institution[institution.index()] {
                return Err(MatchingError::InstitutionAssignedTwice {
                    institution,
                    first,
                    second: student,
                });
            }
            matching.by_student[student.index()] = Some(institution);
            matching.by_institution[institution.index()] = Some(student);
        }
        Ok(matching)
    }

    /// Build from the receiver-side holder array the engine maintains.
    pub(crate) fn from_holders(student_count: usize, holders: &[Option<StudentId>]) -> Self {
        let mut by_student = vec![None; student_count];
        for (institution, holder) in holders.iter().enumerate() {
            if let Some(student) = holder {
                by_student[student.index()] = Some(InstitutionId::new(institution));
            }
        }
        Self {
            by_student,
            by_institution: holders.to_vec(),
        }
    }

    pub fn institution_of(&self, student: StudentId) -> Option<InstitutionId> {
        self.by_student.get(student.index()).copied().flatten()
    }

    pub fn student_of(&self, institution: InstitutionId) -> Option<StudentId> {
        self.by_institution.get(institution.index()).copied().flatten()
    }

    /// Matched pairs in ascending student order.
    pub fn pairs(&self) -> impl Iterator<Item = (StudentId, InstitutionId)> + '_ {
        self.by_student
            .iter()
            .enumerate()
            .filter_map(|(s, i)| i.map(|i| (StudentId::new(s), i)))
    }

    pub fn unmatched_students(&self) -> impl Iterator<Item = StudentId> + '_ {
        self.by_student
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_none())
            .map(|(s, _)| StudentId::new(s))
    }

    pub fn unmatched_institutions(&self) -> impl Iterator<Item = InstitutionId> + '_ {
        self.by_institution
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| InstitutionId::new(i))
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.by_student.iter().filter(|i| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn student_count(&self) -> usize {
        self.by_student.len()
    }

    pub fn institution_count(&self) -> usize {
        self.by_institution.len()
    }

    /// True when both populations have the same size and every agent is matched.
    pub fn is_perfect(&self) -> bool {
        self.by_student.len() == self.by_institution.len()
            && self.by_student.iter().all(Option::is_some)
            && self.by_institution.iter().all(Option::is_some)
    }
}

impl fmt::Display for Matching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Matching ({} pairs) ===", self.len())?;
        for (student, institution) in self.pairs() {
            writeln!(f, "  {} -> {}", student, institution)?;
        }
        for student in self.unmatched_students() {
            writeln!(f, "  {} unmatched", student)?;
        }
        Ok(())
    }
}

/// Serialized shape of a [`Matching`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatchingRepr {
    students: usize,
    institutions: usize,
    pairs: Vec<(StudentId, InstitutionId)>,
}

impl TryFrom<MatchingRepr> for Matching {
    type Error = MatchingError;

    fn try_from(repr: MatchingRepr) -> Result<Self, Self::Error> {
        Matching::from_pairs(repr.students, repr.institutions, repr.pairs)
    }
}

impl From<Matching> for MatchingRepr {
    fn from(matching: Matching) -> Self {
        MatchingRepr {
            students: matching.student_count(),
            institutions: matching.institution_count(),
            pairs: matching.pairs().collect(),
        }
    }
}
