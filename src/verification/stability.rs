//! Independent stability check.
//!
//! Nothing here touches the engine or the rank tables inside
//! [`PreferenceModel`]: ranks are rebuilt from the raw lists on every call
//! so that the check can act as an oracle for the engine's output.

use crate::core::agent::{InstitutionId, StudentId};
use crate::core::matching::Matching;
use crate::core::preference::PreferenceModel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A student and an institution, not matched to each other, that both
/// prefer each other to their current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockingPair {
    pub student: StudentId,
    pub institution: InstitutionId,
}

impl fmt::Display for BlockingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.student, self.institution)
    }
}

/// Outcome of a stability check.
///
/// Blocking pairs are listed by ascending student id, then in the order
/// the student ranks the institutions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityReport {
    blocking_pairs: Vec<BlockingPair>,
}

impl StabilityReport {
    /// True iff no blocking pair was found.
    pub fn is_stable(&self) -> bool {
        self.blocking_pairs.is_empty()
    }

    pub fn blocking_pairs(&self) -> &[BlockingPair] {
        &self.blocking_pairs
    }

    pub fn into_parts(self) -> (bool, Vec<BlockingPair>) {
        (self.blocking_pairs.is_empty(), self.blocking_pairs)
    }
}

impl fmt::Display for StabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Stability Check ===")?;
        writeln!(f, "Stable:         {}", self.is_stable())?;
        writeln!(f, "Blocking pairs: {}", self.blocking_pairs.len())?;
        for pair in &self.blocking_pairs {
            writeln!(f, "  {}", pair)?;
        }
        Ok(())
    }
}

/// Scan `matching` for blocking pairs.
///
/// `students[s]` lists institution ids best-first and `institutions[i]`
/// lists student ids best-first. An unmatched agent prefers any partner
/// to none. For each student only the institutions it ranks above its
/// current partner are examined, since preferences are strict.
///
/// Malformed lists are tolerated: entries outside the institution range
/// are skipped and a partner missing from a list counts as least preferred.
///
/// # Examples
///
/// ```
/// use stable_matching::core::agent::{InstitutionId, StudentId};
/// use stable_matching::core::matching::Matching;
/// use stable_matching::verification::stability::check;
///
/// let students = vec![vec![0, 1], vec![0, 1]];
/// let institutions = vec![vec![0, 1], vec![0, 1]];
///
/// // Student 0 and institution 0 rank each other first but are apart.
/// let swapped = Matching::from_pairs(2, 2, [
///     (StudentId::new(0), InstitutionId::new(1)),
///     (StudentId::new(1), InstitutionId::new(0)),
/// ]).unwrap();
///
/// let report = check(&swapped, &students, &institutions);
/// assert!(!report.is_stable());
/// assert_eq!(report.blocking_pairs().len(), 1);
/// ```
pub fn check(matching: &Matching, students: &[Vec<usize>], institutions: &[Vec<usize>]) -> StabilityReport {
    let student_ranks = rank_maps(students);
    let institution_ranks = rank_maps(institutions);

    let mut blocking_pairs = Vec::new();
    for (s, list) in students.iter().enumerate() {
        let student = StudentId::new(s);
        let partner = matching.institution_of(student);

        for &i in list {
            if i >= institutions.len() {
                continue;
            }
            let institution = InstitutionId::new(i);
            if partner == Some(institution) {
                break;
            }

            let student_prefers = match partner {
                None => true,
                Some(p) => rank_of(&student_ranks, s, i) < rank_of(&student_ranks, s, p.index()),
            };
            let institution_prefers = match matching.student_of(institution) {
                None => true,
                Some(h) => rank_of(&institution_ranks, i, s) < rank_of(&institution_ranks, i, h.index()),
            };

            if student_prefers && institution_prefers {
                blocking_pairs.push(BlockingPair { student, institution });
            }
        }
    }

    StabilityReport { blocking_pairs }
}

/// [`check`] against the raw tables held by `model`.
pub fn check_model(matching: &Matching, model: &PreferenceModel) -> StabilityReport {
    check(matching, model.student_table(), model.institution_table())
}

/// Shorthand for `check(..).is_stable()`.
pub fn is_stable(matching: &Matching, students: &[Vec<usize>], institutions: &[Vec<usize>]) -> bool {
    check(matching, students, institutions).is_stable()
}

fn rank_maps(table: &[Vec<usize>]) -> Vec<HashMap<usize, usize>> {
    table
        .iter()
        .map(|list| {
            let mut ranks = HashMap::with_capacity(list.len());
            for (rank, &other) in list.iter().enumerate() {
                ranks.entry(other).or_insert(rank);
            }
            ranks
        })
        .collect()
}

fn rank_of(ranks: &[HashMap<usize, usize>], agent: usize, other: usize) -> usize {
    ranks
        .get(agent)
        .and_then(|r| r.get(&other))
        .copied()
        .unwrap_or(usize::MAX)
}
