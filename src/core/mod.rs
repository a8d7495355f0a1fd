//! Foundational types: agent ids, preference tables, matchings, labels.

pub mod agent;
pub mod matching;
pub mod preference;
pub mod roster;
