use crate::core::agent::{InstitutionId, StudentId};
use crate::core::matching::Matching;
use crate::core::preference::{InvalidPreferenceError, PreferenceModel};
use crate::engine::trace::{ProposalEvent, Response};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Order in which free students are taken off the proposal queue.
///
/// The final matching does not depend on this choice; the sequence of
/// proposals (and therefore the trace) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalOrder {
    /// First in, first out. Students start in ascending id order.
    #[default]
    Fifo,
    /// Last in, first out. The most recently freed student proposes next.
    Lifo,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown proposal order '{0}' (expected 'fifo' or 'lifo')")]
pub struct ParseOrderError(String);

impl FromStr for ProposalOrder {
    type Err = ParseOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(ProposalOrder::Fifo),
            "lifo" => Ok(ProposalOrder::Lifo),
            _ => Err(ParseOrderError(s.to_string())),
        }
    }
}

impl fmt::Display for ProposalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalOrder::Fifo => write!(f, "fifo"),
            ProposalOrder::Lifo => write!(f, "lifo"),
        }
    }
}

/// Where a student stands in the proposal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "institution", rename_all = "snake_case")]
pub enum ProposerState {
    /// Waiting to propose to the next institution on its list.
    Free,
    /// Currently held by an institution.
    Engaged(InstitutionId),
    /// Proposed to every institution and was turned away by all of them.
    Exhausted,
}

/// Result of a deferred-acceptance run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    matching: Matching,
    proposals: usize,
    states: Vec<ProposerState>,
    trace: Option<Vec<ProposalEvent>>,
}

impl MatchOutcome {
    /// The final student → institution assignment.
    pub fn matching(&self) -> &Matching {
        &self.matching
    }

    pub fn into_matching(self) -> Matching {
        self.matching
    }

    /// Total number of proposals made. Never exceeds `|students| × |institutions|`.
    pub fn proposals(&self) -> usize {
        self.proposals
    }

    /// Terminal state of `student`.
    pub fn state(&self, student: StudentId) -> Option<ProposerState> {
        self.states.get(student.index()).copied()
    }

    /// Students that ran out of institutions to propose to.
    pub fn exhausted(&self) -> impl Iterator<Item = StudentId> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == ProposerState::Exhausted)
            .map(|(s, _)| StudentId::new(s))
    }

    /// Every proposal in processing order, if tracing was enabled.
    pub fn trace(&self) -> Option<&[ProposalEvent]> {
        self.trace.as_deref()
    }

    pub fn into_parts(self) -> (Matching, Option<Vec<ProposalEvent>>) {
        (self.matching, self.trace)
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Deferred Acceptance ===")?;
        writeln!(f, "Students:       {}", self.matching.student_count())?;
        writeln!(f, "Institutions:   {}", self.matching.institution_count())?;
        writeln!(f, "Proposals:      {}", self.proposals)?;
        writeln!(f, "Matched pairs:  {}", self.matching.len())?;
        writeln!(f, "Exhausted:      {}", self.exhausted().count())?;
        if let Some(trace) = &self.trace {
            writeln!(f, "\n--- Trace ---")?;
            for event in trace {
                writeln!(f, "  {}", event)?;
            }
        }
        writeln!(f)?;
        write!(f, "{}", self.matching)
    }
}

/// Pool of students waiting to propose.
struct FreeProposers {
    order: ProposalOrder,
    queue: VecDeque<StudentId>,
}

impl FreeProposers {
    fn new(order: ProposalOrder, student_count: usize) -> Self {
        Self {
            order,
            queue: (0..student_count).map(StudentId::new).collect(),
        }
    }

    fn pop(&mut self) -> Option<StudentId> {
        match self.order {
            ProposalOrder::Fifo => self.queue.pop_front(),
            ProposalOrder::Lifo => self.queue.pop_back(),
        }
    }

    fn push(&mut self, student: StudentId) {
        self.queue.push_back(student);
    }
}

/// The deferred-acceptance (Gale–Shapley) engine, students proposing.
///
/// Each free student proposes to the best institution it has not yet
/// tried. An institution holds the best proposer seen so far and releases
/// its previous holder when a better one arrives. The run stops when no
/// student is free, after at most `|students| × |institutions|` proposals
/// since every student's list pointer only moves forward.
///
/// The result is the student-optimal stable matching.
///
/// # Examples
///
/// ```
/// use stable_matching::engine::deferred_acceptance::MatchingEngine;
///
/// let outcome = MatchingEngine::new()
///     .solve(
///         vec![vec![0, 1], vec![0, 1]],
///         vec![vec![1, 0], vec![0, 1]],
///     )
///     .unwrap();
///
/// let pairs: Vec<_> = outcome.matching().pairs().map(|(s, i)| (s.index(), i.index())).collect();
/// assert_eq!(pairs, vec![(0, 1), (1, 0)]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingEngine {
    order: ProposalOrder,
    record_trace: bool,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every proposal together with a snapshot of the holders.
    ///
    /// Each snapshot is O(|institutions|), so this is meant for analysis of
    /// small instances.
    pub fn with_trace(mut self, record: bool) -> Self {
        self.record_trace = record;
        self
    }

    pub fn with_order(mut self, order: ProposalOrder) -> Self {
        self.order = order;
        self
    }

    pub fn order(&self) -> ProposalOrder {
        self.order
    }

    /// Validate raw preference tables, then run.
    pub fn solve(
        &self,
        students: Vec<Vec<usize>>,
        institutions: Vec<Vec<usize>>,
    ) -> Result<MatchOutcome, InvalidPreferenceError> {
        let model = PreferenceModel::build(students, institutions)?;
        Ok(self.run(&model))
    }

    /// Run deferred acceptance to its fixed point.
    pub fn run(&self, model: &PreferenceModel) -> MatchOutcome {
        let student_count = model.student_count();
        let institution_count = model.institution_count();

        let mut next_choice = vec![0usize; student_count];
        let mut holders: Vec<Option<StudentId>> = vec![None; institution_count];
        let mut states = vec![ProposerState::Free; student_count];
        let mut free = FreeProposers::new(self.order, student_count);
        let mut events = self.record_trace.then(Vec::new);
        let mut proposals = 0usize;

        while let Some(student) = free.pop() {
            let s = student.index();
            let Some(institution) = model.student_choice(student, next_choice[s]) else {
                debug!("{} exhausted its list after {} proposals", student, next_choice[s]);
                states[s] = ProposerState::Exhausted;
                continue;
            };
            next_choice[s] += 1;

            let i = institution.index();
            let current = holders[i];
            let response = match current {
                None => {
                    holders[i] = Some(student);
                    states[s] = ProposerState::Engaged(institution);
                    Response::Accepted
                }
                Some(holder)
                    if model.institution_rank(institution, student)
                        < model.institution_rank(institution, holder) =>
                {
                    holders[i] = Some(student);
                    states[s] = ProposerState::Engaged(institution);
                    states[holder.index()] = ProposerState::Free;
                    free.push(holder);
                    Response::Displaced { previous: holder }
                }
                Some(holder) => {
                    free.push(student);
                    Response::Rejected { holder }
                }
            };
            trace!("{} -> {}: {:?}", student, institution, response);

            if let Some(events) = events.as_mut() {
                events.push(ProposalEvent {
                    step: proposals,
                    student,
                    institution,
                    response,
                    holders: holders.clone(),
                });
            }
            proposals += 1;
        }

        let matching = Matching::from_holders(student_count, &holders);
        debug!(
            "deferred acceptance ({}) finished: {} students, {} institutions, {} proposals, {} pairs",
            self.order,
            student_count,
            institution_count,
            proposals,
            matching.len()
        );

        MatchOutcome {
            matching,
            proposals,
            states,
            trace: events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::Side;

    fn s(i: usize) -> StudentId {
        StudentId::new(i)
    }

    fn i(i: usize) -> InstitutionId {
        InstitutionId::new(i)
    }

    /// Students A..D = 0..3, institutions W..Z = 0..3.
    fn four_by_four() -> PreferenceModel {
        PreferenceModel::build(
            vec![vec![1, 0, 2, 3], vec![0, 1, 2, 3], vec![0, 1, 3, 2], vec![1, 2, 0, 3]],
            vec![vec![1, 2, 0, 3], vec![3, 0, 1, 2], vec![0, 1, 2, 3], vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_four_by_four_fifo() {
        let outcome = MatchingEngine::new().run(&four_by_four());
        let pairs: Vec<_> = outcome.matching().pairs().collect();
        assert_eq!(pairs, vec![(s(0), i(2)), (s(1), i(0)), (s(2), i(3)), (s(3), i(1))]);
        assert_eq!(outcome.proposals(), 8);
        assert!(outcome.matching().is_perfect());
        assert!(outcome.trace().is_none());
    }

    #[test]
    fn test_four_by_four_trace() {
        let outcome = MatchingEngine::new().with_trace(true).run(&four_by_four());
        let trace = outcome.trace().unwrap();
        assert_eq!(trace.len(), outcome.proposals());

        let steps: Vec<_> = trace
            .iter()
            .map(|e| (e.student, e.institution, e.response))
            .collect();
        assert_eq!(
            steps,
            vec![
                (s(0), i(1), Response::Accepted),
                (s(1), i(0), Response::Accepted),
                (s(2), i(0), Response::Rejected { holder: s(1) }),
                (s(3), i(1), Response::Displaced { previous: s(0) }),
                (s(2), i(1), Response::Rejected { holder: s(3) }),
                (s(0), i(0), Response::Rejected { holder: s(1) }),
                (s(2), i(3), Response::Accepted),
                (s(0), i(2), Response::Accepted),
            ]
        );

        // Snapshot is taken after the event is applied.
        assert_eq!(trace[3].holders, vec![Some(s(1)), Some(s(3)), None, None]);
        assert_eq!(trace[7].holders, vec![Some(s(1)), Some(s(3)), Some(s(0)), Some(s(2))]);
        assert!(trace.iter().enumerate().all(|(n, e)| e.step == n));
    }

    #[test]
    fn test_lifo_reaches_same_matching() {
        let model = four_by_four();
        let fifo = MatchingEngine::new().run(&model);
        let lifo = MatchingEngine::new().with_order(ProposalOrder::Lifo).run(&model);
        assert_eq!(fifo.matching(), lifo.matching());
    }

    #[test]
    fn test_more_students_than_institutions() {
        let model = PreferenceModel::build(
            vec![vec![0, 1], vec![0, 1], vec![0, 1]],
            vec![vec![0, 1, 2], vec![0, 1, 2]],
        )
        .unwrap();
        let outcome = MatchingEngine::new().run(&model);

        assert_eq!(outcome.matching().institution_of(s(0)), Some(i(0)));
        assert_eq!(outcome.matching().institution_of(s(1)), Some(i(1)));
        assert_eq!(outcome.matching().institution_of(s(2)), None);
        assert_eq!(outcome.exhausted().collect::<Vec<_>>(), vec![s(2)]);
        assert_eq!(outcome.state(s(0)), Some(ProposerState::Engaged(i(0))));
        assert_eq!(outcome.state(s(2)), Some(ProposerState::Exhausted));
        assert_eq!(outcome.proposals(), 5);
    }

    #[test]
    fn test_more_institutions_than_students() {
        let model = PreferenceModel::build(
            vec![vec![2, 1, 0], vec![2, 0, 1]],
            vec![vec![0, 1], vec![1, 0], vec![1, 0]],
        )
        .unwrap();
        let outcome = MatchingEngine::new().run(&model);

        assert_eq!(outcome.matching().institution_of(s(1)), Some(i(2)));
        assert_eq!(outcome.matching().institution_of(s(0)), Some(i(1)));
        assert_eq!(outcome.matching().unmatched_institutions().collect::<Vec<_>>(), vec![i(0)]);
        assert_eq!(outcome.exhausted().count(), 0);
    }

    #[test]
    fn test_empty_populations() {
        let outcome = MatchingEngine::new().solve(vec![], vec![]).unwrap();
        assert!(outcome.matching().is_empty());
        assert_eq!(outcome.proposals(), 0);

        let outcome = MatchingEngine::new().solve(vec![vec![], vec![]], vec![]).unwrap();
        assert!(outcome.matching().is_empty());
        assert_eq!(outcome.exhausted().count(), 2);
    }

    #[test]
    fn test_invalid_preferences_are_rejected() {
        let err = MatchingEngine::new()
            .solve(vec![vec![0, 0]], vec![vec![0], vec![0]])
            .unwrap_err();
        assert!(matches!(
            err,
            InvalidPreferenceError::Duplicate { side: Side::Students, agent: 0, entry: 0 }
        ));
    }

    #[test]
    fn test_proposal_bound_on_worst_case() {
        // Everyone shares the same list on both sides: the last student
        // is rejected by every institution before its last choice.
        let n = 6;
        let list: Vec<usize> = (0..n).collect();
        let model = PreferenceModel::build(vec![list.clone(); n], vec![list; n]).unwrap();
        let outcome = MatchingEngine::new().run(&model);
        assert!(outcome.matching().is_perfect());
        assert_eq!(outcome.proposals(), n * (n + 1) / 2);
        assert!(outcome.proposals() <= n * n);
    }

    #[test]
    fn test_parse_order() {
        assert_eq!("FIFO".parse::<ProposalOrder>().unwrap(), ProposalOrder::Fifo);
        assert_eq!("lifo".parse::<ProposalOrder>().unwrap(), ProposalOrder::Lifo);
        assert!("random".parse::<ProposalOrder>().is_err());
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = MatchingEngine::new().with_trace(true).run(&four_by_four());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["proposals"], 8);
        assert_eq!(json["trace"].as_array().unwrap().len(), 8);
        assert_eq!(json["states"][0], serde_json::json!({"state": "engaged", "institution": 2}));
    }
}
