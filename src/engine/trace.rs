use crate::core::agent::{InstitutionId, StudentId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an institution answered a single proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// The institution was free and now holds the proposer.
    Accepted,
    /// The institution dropped `previous` in favour of the proposer.
    Displaced { previous: StudentId },
    /// The institution kept `holder` and turned the proposer away.
    Rejected { holder: StudentId },
}

impl Response {
    /// Whether the proposer is held after this event.
    pub fn is_held(self) -> bool {
        !matches!(self, Response::Rejected { .. })
    }
}

/// One proposal in a deferred-acceptance run.
///
/// Events are appended in the order the engine processes them and are
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalEvent {
    /// Zero-based position of this proposal in the run.
    pub step: usize,
    pub student: StudentId,
    pub institution: InstitutionId,
    pub response: Response,
    /// Holder of every institution immediately after this event,
    /// indexed by institution id.
    pub holders: Vec<Option<StudentId>>,
}

impl ProposalEvent {
    /// The student this event turned away, if any.
    ///
    /// That is the proposer on a rejection, or the displaced holder when
    /// the institution switched.
    pub fn turned_away(&self) -> Option<StudentId> {
        match self.response {
            Response::Accepted => None,
            Response::Displaced { previous } => Some(previous),
            Response::Rejected { .. } => Some(self.student),
        }
    }
}

impl fmt::Display for ProposalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<4} {} -> {}: ", self.step, self.student, self.institution)?;
        match self.response {
            Response::Accepted => write!(f, "accepted"),
            Response::Displaced { previous } => write!(f, "accepted, {} released", previous),
            Response::Rejected { holder } => write!(f, "rejected, keeps {}", holder),
        }
    }
}
