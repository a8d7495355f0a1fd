use crate::core::agent::{InstitutionId, Side, StudentId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors arising from malformed preference data.
///
/// Every variant names the side and agent whose list is at fault so the
/// generating code can be fixed. None of these are transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPreferenceError {
    #[error("{} {agent} ranks {actual} {}, expected {expected}", .side.noun(), .side.opposite())]
    WrongLength {
        side: Side,
        agent: usize,
        expected: usize,
        actual: usize,
    },
    #[error("{} {agent} ranks unknown {} {entry} (valid range 0..{limit})", .side.noun(), .side.opposite().noun())]
    OutOfRange {
        side: Side,
        agent: usize,
        entry: usize,
        limit: usize,
    },
    #[error("{} {agent} ranks {} {entry} more than once", .side.noun(), .side.opposite().noun())]
    Duplicate {
        side: Side,
        agent: usize,
        entry: usize,
    },
    #[error("unknown {} '{name}' listed by {} '{listed_by}'", .side.noun(), .side.opposite().noun())]
    UnknownAgent {
        side: Side,
        name: String,
        listed_by: String,
    },
    #[error("{} '{name}' is listed more than once", .side.noun())]
    DuplicateAgent { side: Side, name: String },
}

/// Unvalidated preference tables, indexed by agent id on each side.
///
/// `students[s]` lists institution ids from most to least preferred and
/// `institutions[i]` lists student ids the same way. This is the wire form
/// of a [`PreferenceModel`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPreferences {
    pub students: Vec<Vec<usize>>,
    pub institutions: Vec<Vec<usize>>,
}

/// Validated, complete and strict preferences for both populations.
///
/// Holds the supplied lists plus derived rank tables, where
/// `rank[a][b]` is the position of `b` in `a`'s list (0 = most preferred).
/// Construction is the only fallible step; every lookup afterwards is O(1).
///
/// # Examples
///
/// ```
/// use stable_matching::core::agent::{InstitutionId, Side, StudentId};
/// use stable_matching::core::preference::PreferenceModel;
///
/// let model = PreferenceModel::build(
///     vec![vec![1, 0], vec![0, 1]],
///     vec![vec![0, 1], vec![1, 0]],
/// ).unwrap();
///
/// assert_eq!(model.rank(Side::Students, 0, 1), Some(0));
/// assert_eq!(model.institution_rank(InstitutionId::new(1), StudentId::new(1)), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPreferences", into = "RawPreferences")]
pub struct PreferenceModel {
    students: Vec<Vec<usize>>,
    institutions: Vec<Vec<usize>>,
    student_ranks: Vec<Vec<usize>>,
    institution_ranks: Vec<Vec<usize>>,
}

impl PreferenceModel {
    /// Validate both tables and derive their rank tables.
    ///
    /// Student lists are checked first, then institution lists, each in
    /// ascending agent order. The first violation found is returned.
    pub fn build(
        students: Vec<Vec<usize>>,
        institutions: Vec<Vec<usize>>,
    ) -> Result<Self, InvalidPreferenceError> {
        let student_ranks = rank_table(Side::Students, &students, institutions.len())?;
        let institution_ranks = rank_table(Side::Institutions, &institutions, students.len())?;
        Ok(Self {
            students,
            institutions,
            student_ranks,
            institution_ranks,
        })
    }

    /// Build from tables that are permutations by construction.
    pub(crate) fn from_permutations(students: Vec<Vec<usize>>, institutions: Vec<Vec<usize>>) -> Self {
        debug_assert!(rank_table(Side::Students, &students, institutions.len()).is_ok());
        debug_assert!(rank_table(Side::Institutions, &institutions, students.len()).is_ok());
        let student_ranks = students.iter().map(|list| invert(list)).collect();
        let institution_ranks = institutions.iter().map(|list| invert(list)).collect();
        Self {
            students,
            institutions,
            student_ranks,
            institution_ranks,
        }
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn institution_count(&self) -> usize {
        self.institutions.len()
    }

    /// Number of agents on `side`.
    pub fn count(&self, side: Side) -> usize {
        match side {
            Side::Students => self.student_count(),
            Side::Institutions => self.institution_count(),
        }
    }

    /// Ordered preference list of `agent` on `side`, or `None` if no such agent.
    pub fn preferences(&self, side: Side, agent: usize) -> Option<&[usize]> {
        self.table(side).get(agent).map(Vec::as_slice)
    }

    /// Rank that `agent` on `side` gives to `other` on the opposite side.
    pub fn rank(&self, side: Side, agent: usize, other: usize) -> Option<usize> {
        let ranks = match side {
            Side::Students => &self.student_ranks,
            Side::Institutions => &self.institution_ranks,
        };
        ranks.get(agent).and_then(|row| row.get(other)).copied()
    }

    /// Institutions in the order `student` prefers them.
    ///
    /// # Panics
    ///
    /// Panics if `student` is out of range.
    pub fn student_preferences(&self, student: StudentId) -> impl Iterator<Item = InstitutionId> + '_ {
        self.students[student.index()].iter().copied().map(InstitutionId::new)
    }

    /// Students in the order `institution` prefers them.
    ///
    /// # Panics
    ///
    /// Panics if `institution` is out of range.
    pub fn institution_preferences(
        &self,
        institution: InstitutionId,
    ) -> impl Iterator<Item = StudentId> + '_ {
        self.institutions[institution.index()].iter().copied().map(StudentId::new)
    }

    /// Institution at position `position` of `student`'s list, or `None`
    /// past its end.
    ///
    /// # Panics
    ///
    /// Panics if `student` is out of range.
    pub fn student_choice(&self, student: StudentId, position: usize) -> Option<InstitutionId> {
        self.students[student.index()]
            .get(position)
            .copied()
            .map(InstitutionId::new)
    }

    /// # Panics
    ///
    /// Panics if either id is out of range.
    pub fn student_rank(&self, student: StudentId, institution: InstitutionId) -> usize {
        self.student_ranks[student.index()][institution.index()]
    }

    /// # Panics
    ///
    /// Panics if either id is out of range.
    pub fn institution_rank(&self, institution: InstitutionId, student: StudentId) -> usize {
        self.institution_ranks[institution.index()][student.index()]
    }

    /// The raw student table, `students[s]` being a list of institution ids.
    pub fn student_table(&self) -> &[Vec<usize>] {
        &self.students
    }

    /// The raw institution table, `institutions[i]` being a list of student ids.
    pub fn institution_table(&self) -> &[Vec<usize>] {
        &self.institutions
    }

    pub fn to_raw(&self) -> RawPreferences {
        RawPreferences {
            students: self.students.clone(),
            institutions: self.institutions.clone(),
        }
    }

    fn table(&self, side: Side) -> &[Vec<usize>] {
        match side {
            Side::Students => &self.students,
            Side::Institutions => &self.institutions,
        }
    }
}

impl TryFrom<RawPreferences> for PreferenceModel {
    type Error = InvalidPreferenceError;

    fn try_from(raw: RawPreferences) -> Result<Self, Self::Error> {
        Self::build(raw.students, raw.institutions)
    }
}

impl From<PreferenceModel> for RawPreferences {
    fn from(model: PreferenceModel) -> Self {
        RawPreferences {
            students: model.students,
            institutions: model.institutions,
        }
    }
}

const UNRANKED: usize = usize::MAX;

/// Check that every list on `side` is a permutation of `0..opposite` and
/// return the inverted (rank) table.
fn rank_table(
    side: Side,
    lists: &[Vec<usize>],
    opposite: usize,
) -> Result<Vec<Vec<usize>>, InvalidPreferenceError> {
    let mut ranks = Vec::with_capacity(lists.len());
    for (agent, list) in lists.iter().enumerate() {
        if list.len() != opposite {
            return Err(InvalidPreferenceError::WrongLength {
                side,
                agent,
                expected: opposite,
                actual: list.len(),
            });
        }
        let mut row = vec![UNRANKED; opposite];
        for (rank, &entry) in list.iter().enumerate() {
            if entry >= opposite {
                return Err(InvalidPreferenceError::OutOfRange {
                    side,
                    agent,
                    entry,
                    limit: opposite,
                });
            }
            if row[entry] != UNRANKED {
                return Err(InvalidPreferenceError::Duplicate { side, agent, entry });
            }
            row[entry] = rank;
        }
        ranks.push(row);
    }
    Ok(ranks)
}

fn invert(list: &[usize]) -> Vec<usize> {
    let mut row = vec![0; list.len()];
    for (rank, &entry) in list.iter().enumerate() {
        row[entry] = rank;
    }
    row
}
