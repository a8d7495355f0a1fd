use approx::assert_abs_diff_eq;
use stable_matching::analysis::satisfaction::SatisfactionAnalyzer;
use stable_matching::core::agent::{InstitutionId, Side, StudentId};
use stable_matching::core::matching::Matching;
use stable_matching::core::preference::{InvalidPreferenceError, PreferenceModel, RawPreferences};
use stable_matching::core::roster::{NamedPreferences, Roster};
use stable_matching::engine::deferred_acceptance::{MatchingEngine, ProposalOrder, ProposerState};
use stable_matching::engine::trace::Response;
use stable_matching::simulation::experiment::{ExperimentConfig, ExperimentRunner, Scenario};
use stable_matching::simulation::generator::PreferenceGenerator;
use stable_matching::verification::optimality::unrefused_choices;
use stable_matching::verification::stability;

/// Students A-D, institutions W-Z.
fn four_by_four_named() -> NamedPreferences {
    NamedPreferences::from_lists(
        [
            ("A", vec!["X", "W", "Y", "Z"]),
            ("B", vec!["W", "X", "Y", "Z"]),
            ("C", vec!["W", "X", "Z", "Y"]),
            ("D", vec!["X", "Y", "W", "Z"]),
        ],
        [
            ("W", vec!["B", "C", "A", "D"]),
            ("X", vec!["D", "A", "B", "C"]),
            ("Y", vec!["A", "B", "C", "D"]),
            ("Z", vec!["A", "B", "C", "D"]),
        ],
    )
}

fn labelled_pairs(matching: &Matching, roster: &Roster) -> Vec<(String, String)> {
    matching
        .pairs()
        .map(|(s, i)| {
            (
                roster.student_label(s).unwrap().to_string(),
                roster.institution_label(i).unwrap().to_string(),
            )
        })
        .collect()
}

/// Full pipeline: named input → model → engine → verifier → certificate → analysis.
#[test]
fn full_pipeline_four_by_four() {
    let (model, roster) = four_by_four_named().into_model().unwrap();
    assert_eq!(model.student_count(), 4);
    assert_eq!(model.institution_count(), 4);

    let outcome = MatchingEngine::new().with_trace(true).run(&model);
    assert_eq!(outcome.proposals(), 8);
    assert_eq!(
        labelled_pairs(outcome.matching(), &roster),
        vec![
            ("A".to_string(), "Y".to_string()),
            ("B".to_string(), "W".to_string()),
            ("C".to_string(), "Z".to_string()),
            ("D".to_string(), "X".to_string()),
        ]
    );
    assert!(outcome.matching().is_perfect());
    assert_eq!(outcome.exhausted().count(), 0);

    // Independent check
    let report = stability::check_model(outcome.matching(), &model);
    assert!(report.is_stable(), "engine output must be stable: {}", report);

    // Every better choice was refused at some point
    let trace = outcome.trace().unwrap();
    assert!(unrefused_choices(outcome.matching(), trace, model.student_table()).is_empty());

    // Satisfaction
    let satisfaction = SatisfactionAnalyzer::new(&model, outcome.matching()).report();
    assert_eq!(satisfaction.student_ranks, vec![2, 0, 2, 0]);
    assert_eq!(satisfaction.institution_ranks, vec![0, 0, 2, 0]);
    assert_eq!(satisfaction.social_cost, 6);
    assert_eq!(satisfaction.student_top_choices, 2);
    assert_eq!(satisfaction.institution_top_choices, 3);
    assert_abs_diff_eq!(satisfaction.student_satisfaction, 2.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(satisfaction.institution_satisfaction, 1.0 - 0.5 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(satisfaction.overall_satisfaction, 0.75, epsilon = 1e-12);
}

#[test]
fn four_by_four_trace_sequence() {
    let (model, _) = four_by_four_named().into_model().unwrap();
    let outcome = MatchingEngine::new().with_trace(true).run(&model);
    let trace = outcome.trace().unwrap();

    let s = StudentId::new;
    let i = InstitutionId::new;
    let summary: Vec<_> = trace.iter().map(|e| (e.student, e.institution, e.response)).collect();
    assert_eq!(
        summary,
        vec![
            (s(0), i(1), Response::Accepted),
            (s(1), i(0), Response::Accepted),
            (s(2), i(0), Response::Rejected { holder: s(1) }),
            (s(3), i(1), Response::Displaced { previous: s(0) }),
            (s(2), i(1), Response::Rejected { holder: s(3) }),
            (s(0), i(0), Response::Rejected { holder: s(1) }),
            (s(2), i(3), Response::Accepted),
            (s(0), i(2), Response::Accepted),
        ]
    );

    // The last snapshot is the final matching.
    let last = trace.last().unwrap();
    assert_eq!(last.holders, vec![Some(s(1)), Some(s(3)), Some(s(0)), Some(s(2))]);
    for (step, event) in trace.iter().enumerate() {
        assert_eq!(event.step, step);
    }
}

#[test]
fn lifo_order_reaches_the_same_matching() {
    let (model, _) = four_by_four_named().into_model().unwrap();
    let fifo = MatchingEngine::new().run(&model);
    let lifo = MatchingEngine::new().with_order(ProposalOrder::Lifo).run(&model);
    assert_eq!(fifo.matching(), lifo.matching());
}

#[test]
fn named_preferences_from_json() {
    let json = r#"{
        "students": {"ann": ["east", "west"], "bo": ["east", "west"]},
        "institutions": {"east": ["bo", "ann"], "west": ["ann", "bo"]}
    }"#;
    let named: NamedPreferences = serde_json::from_str(json).unwrap();
    let (model, roster) = named.into_model().unwrap();
    let outcome = MatchingEngine::new().run(&model);

    assert_eq!(
        labelled_pairs(outcome.matching(), &roster),
        vec![("ann".to_string(), "west".to_string()), ("bo".to_string(), "east".to_string())]
    );
}

#[test]
fn unknown_label_is_rejected() {
    let named = NamedPreferences::from_lists(
        [("ann", vec!["east", "north"])],
        [("east", vec!["ann"]), ("west", vec!["ann"])],
    );
    let err = named.into_model().unwrap_err();
    assert_eq!(err.to_string(), "unknown institution 'north' listed by student 'ann'");
}

#[test]
fn repeated_label_in_json_is_rejected() {
    let json = r#"{
        "students": {"ann": ["east", "west"], "bo": ["east", "west"], "ann": ["west", "east"]},
        "institutions": {"east": ["bo", "ann"], "west": ["ann", "bo"]}
    }"#;
    let named: NamedPreferences = serde_json::from_str(json).unwrap();
    let err = named.into_model().unwrap_err();
    assert_eq!(err.to_string(), "student 'ann' is listed more than once");
}

#[test]
fn model_json_round_trip_validates() {
    let model = PreferenceGenerator::new(5, 3, 11).generate();
    let json = serde_json::to_string(&model).unwrap();
    let back: PreferenceModel = serde_json::from_str(&json).unwrap();
    assert_eq!(back, model);

    // A duplicate entry never makes it past deserialization.
    let broken = r#"{"students": [[0, 0]], "institutions": [[0], [0]]}"#;
    let err = serde_json::from_str::<PreferenceModel>(broken).unwrap_err();
    assert!(err.to_string().contains("more than once"), "got: {}", err);
}

#[test]
fn error_messages_name_the_offender() {
    let err = PreferenceModel::build(vec![vec![0, 1], vec![1]], vec![vec![0, 1], vec![1, 0]]).unwrap_err();
    assert_eq!(err.to_string(), "student 1 ranks 1 institutions, expected 2");

    let err = PreferenceModel::build(vec![vec![0]], vec![vec![3]]).unwrap_err();
    assert_eq!(
        err,
        InvalidPreferenceError::OutOfRange {
            side: Side::Institutions,
            agent: 0,
            entry: 3,
            limit: 1,
        }
    );
    assert_eq!(err.to_string(), "institution 0 ranks unknown student 3 (valid range 0..1)");
}

#[test]
fn more_students_than_institutions() {
    let outcome = MatchingEngine::new()
        .solve(
            vec![vec![0, 1], vec![0, 1], vec![1, 0]],
            vec![vec![2, 0, 1], vec![0, 1, 2]],
        )
        .unwrap();
    let matching = outcome.matching();
    assert_eq!(matching.len(), 2);
    assert_eq!(matching.unmatched_students().count(), 1);
    assert_eq!(matching.unmatched_institutions().count(), 0);

    let leftover = matching.unmatched_students().next().unwrap();
    assert_eq!(outcome.state(leftover), Some(ProposerState::Exhausted));
    assert!(stability::is_stable(
        matching,
        &[vec![0, 1], vec![0, 1], vec![1, 0]],
        &[vec![2, 0, 1], vec![0, 1, 2]],
    ));
}

#[test]
fn more_institutions_than_students() {
    let outcome = MatchingEngine::new()
        .solve(vec![vec![2, 0, 1], vec![2, 1, 0]], vec![vec![0, 1], vec![1, 0], vec![1, 0]])
        .unwrap();
    let matching = outcome.matching();
    assert_eq!(matching.len(), 2);
    assert_eq!(matching.unmatched_institutions().count(), 1);
    assert_eq!(matching.institution_of(StudentId::new(1)), Some(InstitutionId::new(2)));
    assert_eq!(matching.institution_of(StudentId::new(0)), Some(InstitutionId::new(0)));
}

#[test]
fn empty_instance() {
    let outcome = MatchingEngine::new().with_trace(true).solve(vec![], vec![]).unwrap();
    assert_eq!(outcome.proposals(), 0);
    assert!(outcome.matching().is_empty());
    assert_eq!(outcome.trace().map(<[_]>::len), Some(0));
    assert!(stability::check_model(outcome.matching(), &PreferenceModel::build(vec![], vec![]).unwrap()).is_stable());
}

#[test]
fn verifier_flags_hand_built_matching() {
    let (model, roster) = four_by_four_named().into_model().unwrap();
    let pair = |s: &str, i: &str| (roster.student_id(s).unwrap(), roster.institution_id(i).unwrap());
    let matching = Matching::from_pairs(
        4,
        4,
        [pair("A", "X"), pair("B", "W"), pair("C", "Y"), pair("D", "Z")],
    )
    .unwrap();

    let report = stability::check_model(&matching, &model);
    let blocking: Vec<_> = report
        .blocking_pairs()
        .iter()
        .map(|p| {
            (
                roster.student_label(p.student).unwrap(),
                roster.institution_label(p.institution).unwrap(),
            )
        })
        .collect();
    assert_eq!(blocking, vec![("C", "Z"), ("D", "X")]);
}

#[test]
fn matching_json_rejects_double_assignment() {
    let json = r#"{"students": 2, "institutions": 2, "pairs": [[0, 1], [1, 1]]}"#;
    let err = serde_json::from_str::<Matching>(json).unwrap_err();
    assert!(err.to_string().contains("holds both"), "got: {}", err);
}

#[test]
fn raw_preferences_wire_format() {
    let raw = RawPreferences {
        students: vec![vec![1, 0], vec![0, 1]],
        institutions: vec![vec![0, 1], vec![1, 0]],
    };
    let json = serde_json::to_value(&raw).unwrap();
    assert_eq!(json["students"][0], serde_json::json!([1, 0]));

    let model = PreferenceModel::try_from(raw.clone()).unwrap();
    assert_eq!(model.to_raw(), raw);
}

#[test]
fn experiment_batch_is_stable_everywhere() {
    let config = ExperimentConfig {
        scenarios: vec![Scenario::new(30, 30, 42), Scenario::new(25, 40, 7), Scenario::new(40, 25, 7)],
        ..Default::default()
    };
    let results = ExperimentRunner::from_config(&config).run_all(&config.scenarios);
    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(result.stable, "{} produced an unstable matching", result.scenario.name);
        assert!(result.report.student_satisfaction >= 0.0 && result.report.student_satisfaction <= 1.0);
    }
    assert_eq!(results[1].report.student_ranks.len(), 25);
    assert_eq!(results[2].report.student_ranks.len(), 25);
}
