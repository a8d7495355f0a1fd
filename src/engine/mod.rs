//! The deferred-acceptance matching engine and its proposal trace.

pub mod deferred_acceptance;
pub mod trace;

pub use deferred_acceptance::{MatchOutcome, MatchingEngine, ProposalOrder, ProposerState};
pub use trace::{ProposalEvent, Response};
