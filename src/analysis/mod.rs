//! Satisfaction statistics over a finished matching.

pub mod satisfaction;

pub use satisfaction::{SatisfactionAnalyzer, SatisfactionReport};
