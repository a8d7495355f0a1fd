//! Basic deferred-acceptance example.
//!
//! Matches four students to four institutions, prints every proposal,
//! then checks the result for blocking pairs.

use stable_matching::analysis::satisfaction::SatisfactionAnalyzer;
use stable_matching::core::agent::{InstitutionId, StudentId};
use stable_matching::core::matching::Matching;
use stable_matching::core::roster::NamedPreferences;
use stable_matching::engine::deferred_acceptance::MatchingEngine;
use stable_matching::verification::optimality::unrefused_choices;
use stable_matching::verification::stability;

fn main() {
    println!("╔════════════════════════════════════════════╗");
    println!("║  stable-matching: Basic Matching Example   ║");
    println!("╚════════════════════════════════════════════╝\n");

    let named = NamedPreferences::from_lists(
        [
            ("Ana", vec!["North", "East", "South", "West"]),
            ("Ben", vec!["East", "North", "South", "West"]),
            ("Cai", vec!["East", "North", "West", "South"]),
            ("Dee", vec!["North", "South", "East", "West"]),
        ],
        [
            ("East", vec!["Ben", "Cai", "Ana", "Dee"]),
            ("North", vec!["Dee", "Ana", "Ben", "Cai"]),
            ("South", vec!["Ana", "Ben", "Cai", "Dee"]),
            ("West", vec!["Ana", "Ben", "Cai", "Dee"]),
        ],
    );
    let (model, roster) = match named.into_model() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("invalid preferences: {}", e);
            return;
        }
    };
    let student = |s: StudentId| roster.student_label(s).unwrap_or("?");
    let institution = |i: InstitutionId| roster.institution_label(i).unwrap_or("?");

    // --- Scenario 1: Run the engine ---
    println!("━━━ Scenario 1: Deferred Acceptance ━━━\n");

    let outcome = MatchingEngine::new().with_trace(true).run(&model);
    for event in outcome.trace().unwrap_or_default() {
        let verdict = match event.turned_away() {
            None => "accepted".to_string(),
            Some(s) if s == event.student => "rejected".to_string(),
            Some(s) => format!("accepted, {} released", student(s)),
        };
        println!(
            "  #{:<2} {:<4} -> {:<6} {}",
            event.step,
            student(event.student),
            institution(event.institution),
            verdict
        );
    }
    println!();
    for (s, i) in outcome.matching().pairs() {
        println!("  {:<4} => {}", student(s), institution(i));
    }
    println!("\n  {} proposals\n", outcome.proposals());

    // --- Scenario 2: Verify and certify ---
    println!("━━━ Scenario 2: Verification ━━━\n");

    let report = stability::check_model(outcome.matching(), &model);
    println!("{}", report);
    let missing = unrefused_choices(
        outcome.matching(),
        outcome.trace().unwrap_or_default(),
        model.student_table(),
    );
    println!("Student-optimal certificate: {}\n", if missing.is_empty() { "complete" } else { "incomplete" });

    // --- Scenario 3: A hand-built matching ---
    println!("━━━ Scenario 3: Checking a Hand-Built Matching ━━━\n");

    let pairs = [("Ana", "North"), ("Ben", "East"), ("Cai", "South"), ("Dee", "West")]
        .into_iter()
        .filter_map(|(s, i)| Some((roster.student_id(s)?, roster.institution_id(i)?)));
    let manual = match Matching::from_pairs(model.student_count(), model.institution_count(), pairs) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("invalid matching: {}", e);
            return;
        }
    };
    for pair in stability::check_model(&manual, &model).blocking_pairs() {
        println!(
            "  {} and {} would both rather be together",
            student(pair.student),
            institution(pair.institution)
        );
    }
    println!();

    println!("{}", SatisfactionAnalyzer::new(&model, outcome.matching()).report());
}
