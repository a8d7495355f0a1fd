//! Post-hoc checks on a produced matching, independent of the engine state.

pub mod optimality;
pub mod stability;

pub use stability::{check, BlockingPair, StabilityReport};
