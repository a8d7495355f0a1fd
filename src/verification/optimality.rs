//! Proposer-optimality certificate derived from a proposal trace.
//!
//! Deferred acceptance only moves a student down its list after being
//! turned away. So in a student-optimal outcome, every institution a
//! student ranks above its assignment must have refused that student at
//! some point in the trace.

use crate::core::agent::{InstitutionId, StudentId};
use crate::core::matching::Matching;
use crate::engine::trace::ProposalEvent;
use std::collections::HashSet;

/// Institutions each student prefers to its assignment but was never
/// refused by, in ascending student order then preference order.
///
/// An empty result certifies that every student was refused by all of its
/// better choices. Unmatched students must have been refused by every
/// institution on their list.
pub fn unrefused_choices(
    matching: &Matching,
    trace: &[ProposalEvent],
    students: &[Vec<usize>],
) -> Vec<(StudentId, InstitutionId)> {
    let refused: HashSet<(StudentId, InstitutionId)> = trace
        .iter()
        .filter_map(|event| event.turned_away().map(|student| (student, event.institution)))
        .collect();

    let mut missing = Vec::new();
    for (s, list) in students.iter().enumerate() {
        let student = StudentId::new(s);
        let partner = matching.institution_of(student);
        for institution in list.iter().copied().map(InstitutionId::new) {
            if partner == Some(institution) {
                break;
            }
            if !refused.contains(&(student, institution)) {
                missing.push((student, institution));
            }
        }
    }
    missing
}
