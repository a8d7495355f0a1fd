//! Satisfaction across instance sizes.
//!
//! Runs the default batch of seeded scenarios and compares how each side
//! fares as the market grows. Students propose, so they should come out
//! ahead on every row.

use stable_matching::simulation::experiment::{ExperimentConfig, ExperimentRunner, Scenario};

fn main() {
    env_logger::init();

    println!("╔════════════════════════════════════════════════╗");
    println!("║  stable-matching: Satisfaction Study Example   ║");
    println!("╚════════════════════════════════════════════════╝\n");

    // --- Scenario 1: Balanced markets ---
    println!("━━━ Scenario 1: Balanced Markets ━━━\n");

    let config = ExperimentConfig::default();
    let runner = ExperimentRunner::from_config(&config);
    let results = runner.run_all(&config.scenarios);
    for result in &results {
        println!("  {}", result);
    }

    let all_stable = results.iter().all(|r| r.stable);
    let students_ahead = results
        .iter()
        .filter(|r| r.report.student_satisfaction >= r.report.institution_satisfaction)
        .count();
    println!("\n  All stable: {}", all_stable);
    println!("  Students ahead in {}/{} scenarios\n", students_ahead, results.len());

    // --- Scenario 2: Unbalanced markets ---
    println!("━━━ Scenario 2: Unbalanced Markets ━━━\n");

    let scenarios = vec![
        Scenario::new(100, 120, 3).with_name("Seat surplus"),
        Scenario::new(120, 100, 3).with_name("Seat shortage"),
    ];
    for result in runner.run_all(&scenarios) {
        println!("  {}", result);
        println!(
            "    matched {} of {} students, mean student rank {:.2}",
            result.report.student_ranks.len(),
            result.scenario.students,
            result.report.student_mean_rank
        );
    }
    println!();

    // --- Scenario 3: Distribution for the smallest market ---
    if let Some(first) = results.first() {
        println!("━━━ Scenario 3: Rank Distribution ({}) ━━━\n", first.scenario.name);
        println!("{}", first.report);
    }
}
