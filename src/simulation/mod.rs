//! Seeded instance generation and experiment batches.

pub mod experiment;
pub mod generator;
