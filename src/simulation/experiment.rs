//! Batches of independent matching runs over generated instances.
//!
//! Each scenario owns its generator, engine run and analysis; nothing is
//! shared between scenarios, so they can run on separate threads.

use crate::analysis::satisfaction::{SatisfactionAnalyzer, SatisfactionReport};
use crate::engine::deferred_acceptance::{MatchingEngine, ProposalOrder};
use crate::engine::trace::ProposalEvent;
use crate::simulation::generator::PreferenceGenerator;
use crate::verification::stability;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One instance size and seed to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub students: usize,
    pub institutions: usize,
    pub seed: u64,
}

impl Scenario {
    /// A scenario named after its dimensions and seed.
    pub fn new(students: usize, institutions: usize, seed: u64) -> Self {
        Self {
            name: format!("{}x{}_seed{}", students, institutions, seed),
            students,
            institutions,
            seed,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Configuration for an experiment batch.
///
/// Every field has a default, so a JSON file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub scenarios: Vec<Scenario>,
    /// Keep the full proposal trace in each result.
    pub record_trace: bool,
    pub order: ProposalOrder,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            scenarios: vec![
                Scenario::new(10, 10, 42).with_name("Scenario 10x10"),
                Scenario::new(20, 20, 1).with_name("Scenario 20x20"),
                Scenario::new(50, 50, 2).with_name("Scenario 50x50"),
                Scenario::new(100, 100, 2).with_name("Scenario 100x100"),
                Scenario::new(200, 200, 2).with_name("Scenario 200x200"),
                Scenario::new(500, 500, 2).with_name("Scenario 500x500"),
            ],
            record_trace: false,
            order: ProposalOrder::Fifo,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Everything recorded for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub scenario: Scenario,
    pub report: SatisfactionReport,
    /// Verdict of the independent stability check on the engine's output.
    pub stable: bool,
    pub proposals: usize,
    pub trace: Option<Vec<ProposalEvent>>,
}

impl fmt::Display for ExperimentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<20} {:>5}x{:<5} seed {:<6} proposals {:>8}  stable {:<5}  students {:>6.2}%  institutions {:>6.2}%",
            self.scenario.name,
            self.scenario.students,
            self.scenario.institutions,
            self.scenario.seed,
            self.proposals,
            self.stable,
            self.report.student_satisfaction * 100.0,
            self.report.institution_satisfaction * 100.0,
        )
    }
}

/// Runs scenarios: generate, match, verify, analyse.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExperimentRunner {
    engine: MatchingEngine,
}

impl ExperimentRunner {
    pub fn new(engine: MatchingEngine) -> Self {
        Self { engine }
    }

    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self::new(
            MatchingEngine::new()
                .with_order(config.order)
                .with_trace(config.record_trace),
        )
    }

    pub fn run_scenario(&self, scenario: &Scenario) -> ExperimentResult {
        let model = PreferenceGenerator::new(scenario.students, scenario.institutions, scenario.seed).generate();
        let outcome = self.engine.run(&model);
        let stable = stability::check_model(outcome.matching(), &model).is_stable();
        let report = SatisfactionAnalyzer::new(&model, outcome.matching()).report();
        let proposals = outcome.proposals();

        info!(
            "{}: {} proposals, stable={}, student satisfaction {:.3}",
            scenario.name, proposals, stable, report.student_satisfaction
        );

        let (_, trace) = outcome.into_parts();
        ExperimentResult {
            scenario: scenario.clone(),
            report,
            stable,
            proposals,
            trace,
        }
    }

    /// Run every scenario, returning results in scenario order.
    #[cfg(feature = "parallel")]
    pub fn run_all(&self, scenarios: &[Scenario]) -> Vec<ExperimentResult> {
        use rayon::prelude::*;

        scenarios.par_iter().map(|s| self.run_scenario(s)).collect()
    }

    /// Run every scenario, returning results in scenario order.
    #[cfg(not(feature = "parallel"))]
    pub fn run_all(&self, scenarios: &[Scenario]) -> Vec<ExperimentResult> {
        scenarios.iter().map(|s| self.run_scenario(s)).collect()
    }
}
