//! stable-matching CLI
//!
//! Run deferred acceptance and stability checks from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Match students to institutions from a JSON preference file
//! stable-matching match --input prefs.json
//!
//! # Output as JSON, including every proposal
//! stable-matching match --input prefs.json --format json --trace
//!
//! # Check a matching someone else produced
//! stable-matching verify --input prefs.json --matching matching.json
//!
//! # Generate random preferences
//! stable-matching generate --students 10 --institutions 10 --seed 42
//!
//! # Run a batch of seeded experiments
//! stable-matching experiment --config experiments.json
//! ```
//!
//! Set `RUST_LOG=debug` (or `trace`) to see engine progress on stderr.

use log::info;
use stable_matching::analysis::satisfaction::{SatisfactionAnalyzer, SatisfactionReport};
use stable_matching::core::agent::{InstitutionId, StudentId};
use stable_matching::core::matching::Matching;
use stable_matching::core::preference::{PreferenceModel, RawPreferences};
use stable_matching::core::roster::{NamedPreferences, Roster};
use stable_matching::engine::deferred_acceptance::{MatchingEngine, ProposalOrder};
use stable_matching::engine::trace::{ProposalEvent, Response};
use stable_matching::simulation::experiment::{ExperimentConfig, ExperimentRunner};
use stable_matching::simulation::generator::PreferenceGenerator;
use stable_matching::verification::stability::{self, StabilityReport};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"stable-matching: deferred-acceptance matching with stability verification

USAGE:
    stable-matching <COMMAND> [OPTIONS]

COMMANDS:
    match       Compute the student-optimal stable matching
    verify      Check a given matching for blocking pairs (exit code 2 if unstable)
    generate    Generate random complete preferences
    experiment  Run a batch of seeded scenarios
    help        Show this message

OPTIONS (match):
    --input <FILE>      Path to JSON preferences file
    --format <FORMAT>   Output format: text (default) or json
    --order <ORDER>     Proposal order: fifo (default) or lifo
    --trace             Include every proposal in the output

OPTIONS (verify):
    --input <FILE>      Path to JSON preferences file
    --matching <FILE>   Path to JSON matching file
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --students <N>      Number of students (default: 10)
    --institutions <N>  Number of institutions (default: same as students)
    --seed <N>          RNG seed (default: 42)
    --output <FILE>     Write to file instead of stdout

OPTIONS (experiment):
    --config <FILE>     JSON experiment config (default: built-in batch)
    --format <FORMAT>   Output format: text (default) or json

INPUT FORMATS:
    Preferences, by index:  {{ "students": [[1, 0]], "institutions": [[0], [0]] }}
    Preferences, by name:   {{ "students": {{ "ann": ["east", "west"] }},
                              "institutions": {{ "east": ["ann"], "west": ["ann"] }} }}
    Matching:               {{ "pairs": [["ann", "east"]] }}  or  {{ "pairs": [[0, 1]] }}

EXAMPLES:
    stable-matching match --input prefs.json
    stable-matching match --input prefs.json --format json --trace
    stable-matching verify --input prefs.json --matching matching.json
    stable-matching generate --students 50 --institutions 40 --seed 7 --output prefs.json
    stable-matching experiment --format json"#
    );
}

/// Preferences file: either integer tables or name-keyed lists.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum PreferencesFile {
    Indexed(RawPreferences),
    Named(NamedPreferences),
}

/// An agent given either by index or by label.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum AgentRef {
    Index(usize),
    Label(String),
}

#[derive(serde::Deserialize)]
struct MatchingFile {
    pairs: Vec<(AgentRef, AgentRef)>,
}

/// JSON output schema for a matching run.
#[derive(serde::Serialize)]
struct MatchOutput {
    order: ProposalOrder,
    proposals: usize,
    stable: bool,
    pairs: Vec<PairOutput>,
    unmatched_students: Vec<String>,
    unmatched_institutions: Vec<String>,
    satisfaction: SatisfactionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<ProposalEvent>>,
}

#[derive(serde::Serialize)]
struct PairOutput {
    student: String,
    institution: String,
    student_rank: usize,
    institution_rank: usize,
}

#[derive(serde::Serialize)]
struct VerifyOutput {
    stable: bool,
    blocking_pairs: Vec<(String, String)>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)))
}

fn load_preferences(path: &str) -> (PreferenceModel, Roster) {
    let content = read_file(path);
    let file: PreferencesFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing preferences JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(r#"{{ "students": [[1, 0], [0, 1]], "institutions": [[0, 1], [1, 0]] }}"#);
        process::exit(1);
    });

    let loaded = match file {
        PreferencesFile::Indexed(raw) => PreferenceModel::try_from(raw).map(|model| {
            let roster = Roster::indexed(model.student_count(), model.institution_count());
            (model, roster)
        }),
        PreferencesFile::Named(named) => named.into_model(),
    };
    let (model, roster) = loaded.unwrap_or_else(|e| fail(format!("invalid preferences: {}", e)));
    info!(
        "loaded {} students and {} institutions from {}",
        model.student_count(),
        model.institution_count(),
        path
    );
    (model, roster)
}

fn load_matching(path: &str, model: &PreferenceModel, roster: &Roster) -> Matching {
    let content = read_file(path);
    let file: MatchingFile = serde_json::from_str(&content)
        .unwrap_or_else(|e| fail(format!("parsing matching JSON: {}", e)));

    let pairs = file.pairs.into_iter().map(|(s, i)| {
        let student = match s {
            AgentRef::Index(n) => StudentId::new(n),
            AgentRef::Label(label) => roster
                .student_id(&label)
                .unwrap_or_else(|| fail(format!("unknown student '{}'", label))),
        };
        let institution = match i {
            AgentRef::Index(n) => InstitutionId::new(n),
            AgentRef::Label(label) => roster
                .institution_id(&label)
                .unwrap_or_else(|| fail(format!("unknown institution '{}'", label))),
        };
        (student, institution)
    });

    Matching::from_pairs(model.student_count(), model.institution_count(), pairs)
        .unwrap_or_else(|e| fail(format!("invalid matching: {}", e)))
}

fn student_label(roster: &Roster, student: StudentId) -> String {
    roster
        .student_label(student)
        .map(str::to_string)
        .unwrap_or_else(|| student.to_string())
}

fn institution_label(roster: &Roster, institution: InstitutionId) -> String {
    roster
        .institution_label(institution)
        .map(str::to_string)
        .unwrap_or_else(|| institution.to_string())
}

fn describe_event(roster: &Roster, event: &ProposalEvent) -> String {
    let student = student_label(roster, event.student);
    let institution = institution_label(roster, event.institution);
    let outcome = match event.response {
        Response::Accepted => "accepted".to_string(),
        Response::Displaced { previous } => {
            format!("accepted, releases {}", student_label(roster, previous))
        }
        Response::Rejected { holder } => format!("rejected, keeps {}", student_label(roster, holder)),
    };
    format!("#{:<4} {} -> {}: {}", event.step, student, institution, outcome)
}

fn print_stability(report: &StabilityReport, roster: &Roster) {
    println!("Stable: {}", report.is_stable());
    for pair in report.blocking_pairs() {
        println!(
            "  blocking pair: {} and {}",
            student_label(roster, pair.student),
            institution_label(roster, pair.institution)
        );
    }
}

fn parse_format(value: Option<&String>) -> String {
    match value.map(String::as_str) {
        Some(f @ ("text" | "json")) => f.to_string(),
        _ => fail("--format requires 'text' or 'json'"),
    }
}

fn required_path(value: Option<&String>, flag: &str) -> String {
    value.cloned().unwrap_or_else(|| fail(format!("{} requires a file path", flag)))
}

fn parse_number<T: std::str::FromStr>(value: Option<&String>, flag: &str) -> T {
    value
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| fail(format!("{} requires a number", flag)))
}

fn cmd_match(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut order = ProposalOrder::default();
    let mut record_trace = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(required_path(args.get(i), "--input"));
            }
            "--format" => {
                i += 1;
                format = parse_format(args.get(i));
            }
            "--order" => {
                i += 1;
                order = args
                    .get(i)
                    .map(|s| s.parse::<ProposalOrder>().unwrap_or_else(|e| fail(e)))
                    .unwrap_or_else(|| fail("--order requires 'fifo' or 'lifo'"));
            }
            "--trace" => record_trace = true,
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| fail("--input <FILE> is required"));
    let (model, roster) = load_preferences(&path);

    let outcome = MatchingEngine::new()
        .with_order(order)
        .with_trace(record_trace)
        .run(&model);
    let stability = stability::check_model(outcome.matching(), &model);
    let satisfaction = SatisfactionAnalyzer::new(&model, outcome.matching()).report();

    if format == "json" {
        let matching = outcome.matching();
        let output = MatchOutput {
            order,
            proposals: outcome.proposals(),
            stable: stability.is_stable(),
            pairs: matching
                .pairs()
                .map(|(s, i)| PairOutput {
                    student: student_label(&roster, s),
                    institution: institution_label(&roster, i),
                    student_rank: model.student_rank(s, i),
                    institution_rank: model.institution_rank(i, s),
                })
                .collect(),
            unmatched_students: matching
                .unmatched_students()
                .map(|s| student_label(&roster, s))
                .collect(),
            unmatched_institutions: matching
                .unmatched_institutions()
                .map(|i| institution_label(&roster, i))
                .collect(),
            satisfaction,
            trace: outcome.trace().map(<[ProposalEvent]>::to_vec),
        };
        let json = serde_json::to_string_pretty(&output)
            .unwrap_or_else(|e| fail(format!("serializing output: {}", e)));
        println!("{}", json);
    } else {
        if let Some(trace) = outcome.trace() {
            println!("=== Proposals ===");
            for event in trace {
                println!("  {}", describe_event(&roster, event));
            }
            println!();
        }

        println!("=== Matching ({} proposals, order {}) ===", outcome.proposals(), order);
        for (s, i) in outcome.matching().pairs() {
            println!(
                "  {:<12} -> {:<12} (student rank {}, institution rank {})",
                student_label(&roster, s),
                institution_label(&roster, i),
                model.student_rank(s, i),
                model.institution_rank(i, s)
            );
        }
        for s in outcome.matching().unmatched_students() {
            println!("  {:<12} -> (unmatched)", student_label(&roster, s));
        }
        println!();
        print_stability(&stability, &roster);
        println!();
        println!("{}", satisfaction);
    }
}

fn cmd_verify(args: &[String]) {
    let mut input_path = None;
    let mut matching_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(required_path(args.get(i), "--input"));
            }
            "--matching" => {
                i += 1;
                matching_path = Some(required_path(args.get(i), "--matching"));
            }
            "--format" => {
                i += 1;
                format = parse_format(args.get(i));
            }
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| fail("--input <FILE> is required"));
    let matching_path = matching_path.unwrap_or_else(|| fail("--matching <FILE> is required"));
    let (model, roster) = load_preferences(&path);
    let matching = load_matching(&matching_path, &model, &roster);

    let report = stability::check_model(&matching, &model);

    if format == "json" {
        let output = VerifyOutput {
            stable: report.is_stable(),
            blocking_pairs: report
                .blocking_pairs()
                .iter()
                .map(|p| {
                    (
                        student_label(&roster, p.student),
                        institution_label(&roster, p.institution),
                    )
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&output)
            .unwrap_or_else(|e| fail(format!("serializing output: {}", e)));
        println!("{}", json);
    } else {
        print_stability(&report, &roster);
    }

    if !report.is_stable() {
        process::exit(2);
    }
}

fn cmd_generate(args: &[String]) {
    let mut students = 10usize;
    let mut institutions: Option<usize> = None;
    let mut seed = 42u64;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--students" => {
                i += 1;
                students = parse_number(args.get(i), "--students");
            }
            "--institutions" => {
                i += 1;
                institutions = Some(parse_number(args.get(i), "--institutions"));
            }
            "--seed" => {
                i += 1;
                seed = parse_number(args.get(i), "--seed");
            }
            "--output" => {
                i += 1;
                output_path = Some(required_path(args.get(i), "--output"));
            }
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let institutions = institutions.unwrap_or(students);
    let model = PreferenceGenerator::new(students, institutions, seed).generate();
    let json = serde_json::to_string_pretty(&model)
        .unwrap_or_else(|e| fail(format!("serializing preferences: {}", e)));

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!(
            "Generated preferences for {} students and {} institutions (seed {}) → {}",
            students, institutions, seed, path
        );
    } else {
        println!("{}", json);
    }
}

fn cmd_experiment(args: &[String]) {
    let mut config_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = Some(required_path(args.get(i), "--config"));
            }
            "--format" => {
                i += 1;
                format = parse_format(args.get(i));
            }
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => ExperimentConfig::from_json(&read_file(&path))
            .unwrap_or_else(|e| fail(format!("parsing experiment config: {}", e))),
        None => ExperimentConfig::default(),
    };
    info!("running {} scenarios", config.scenarios.len());

    let results = ExperimentRunner::from_config(&config).run_all(&config.scenarios);

    if format == "json" {
        let json = serde_json::to_string_pretty(&results)
            .unwrap_or_else(|e| fail(format!("serializing results: {}", e)));
        println!("{}", json);
    } else {
        for result in &results {
            println!("{}", result);
        }
        if let Some(first) = results.first() {
            println!("\n{}: {}", first.scenario.name, first.report);
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "match" => cmd_match(rest),
        "verify" => cmd_verify(rest),
        "generate" => cmd_generate(rest),
        "experiment" => cmd_experiment(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
