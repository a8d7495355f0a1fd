//! # stable-matching
//!
//! Deferred-acceptance (Gale–Shapley) matching between students and
//! institutions, with an independent stability verifier.
//!
//! Given complete, strict preference lists on both sides, the engine
//! computes the student-optimal stable matching and can record every
//! proposal it made along the way.
//!
//! ## Architecture
//!
//! - **core** — Agent ids, validated preference tables, matchings, labels
//! - **engine** — The proposal/rejection state machine and its trace
//! - **verification** — Blocking-pair scan and proposer-optimality certificate
//! - **analysis** — Rank distributions and satisfaction scores
//! - **simulation** — Seeded preference generation and experiment batches

pub mod analysis;
pub mod core;
pub mod engine;
pub mod simulation;
pub mod verification;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::analysis::satisfaction::{SatisfactionAnalyzer, SatisfactionReport};
    pub use crate::core::agent::{InstitutionId, Side, StudentId};
    pub use crate::core::matching::Matching;
    pub use crate::core::preference::{InvalidPreferenceError, PreferenceModel};
    pub use crate::core::roster::{NamedPreferences, Roster};
    pub use crate::engine::deferred_acceptance::{MatchOutcome, MatchingEngine, ProposalOrder};
    pub use crate::engine::trace::{ProposalEvent, Response};
    pub use crate::simulation::generator::PreferenceGenerator;
    pub use crate::verification::stability::{BlockingPair, StabilityReport};
}
