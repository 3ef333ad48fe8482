//! CareerSim Headless Simulation Harness
//!
//! Validates scoring rules, scenario progression, the lab model and the
//! mini-games without any UI. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p careersim-simtest
//!   cargo run -p careersim-simtest -- --verbose --seed 42
//!   cargo run -p careersim-simtest -- --config sim.json --export-csv lab.csv

use std::path::PathBuf;

use careersim_core::completion::CompletionHook;
use careersim_core::config::SimConfig;
use careersim_core::persistence::{load_snapshot, save_snapshot};
use careersim_core::session::{GovernmentSession, MaterialsLab, LAB_ENTITY_ID};
use careersim_core::storage::{FileStore, KeyValueStore, MemoryStore};
use careersim_logic::attempts::Transition;
use careersim_logic::experiment::{
    evaluate_run, raw_purity, run_experiment, validate_variables, Additive, CoolingMethod,
    ExperimentVariables, HashNoise, NoNoise, Precursor, LEVITATION_RANGE, PURITY_RANGE,
};
use careersim_logic::government::{government_roster, government_rules};
use careersim_logic::negotiation::{budget_negotiation, validate_tree, Ending, Negotiation};
use careersim_logic::office::{rooms, standard_office, OfficeWalk};
use careersim_logic::quiz::{standard_elements, MatchResult, MatchingQuiz};
use careersim_logic::scoring::evaluate;
use careersim_logic::wizard::{marketing_campaign_brief, Track};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "careersim-simtest", about = "Headless validation harness for CareerSim")]
struct Args {
    /// Print every check, not only failures
    #[arg(short, long)]
    verbose: bool,

    /// Seed for lab noise (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the lab notebook CSV here after the lab run
    #[arg(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,
}

// Reference answers that satisfy each stakeholder on the first attempt.
const REFERENCE_ANSWERS: [(&str, &str); 5] = [
    (
        "mayor",
        "Our plan lowers the long-term cost to the city budget and creates local jobs",
    ),
    (
        "environmental_coalition",
        "Electric buses cut emissions and pollution on our busiest routes through town",
    ),
    (
        "business_association",
        "The ordinance brings investment and growth to our downtown corridor and its many shops",
    ),
    (
        "residents_association",
        "Hello neighbors, the plan improves traffic safety for families on every block",
    ),
    (
        "city_council",
        "We have support from 6 members so the ordinance should pass the council vote",
    ),
];
const WEAK_ANSWER: &str = "I think it is a good idea";

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => match SimConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    println!("=== CareerSim Simulation Harness ===\n");
    let verbose = args.verbose;
    let mut results = Vec::new();

    // 1. Scoring rule table
    results.extend(validate_scoring_rules(verbose));

    // 2. Government scenario progression
    results.extend(validate_government_scenario(&config, verbose));

    // 3. Experiment model sweep
    results.extend(validate_experiment_model(verbose));

    // 4. Lab session with notebook
    results.extend(validate_lab_session(&config, args.export_csv.as_ref(), verbose));

    // 5. Session snapshots
    results.extend(validate_snapshots(&config));

    // 6. Mini-games
    results.extend(validate_quiz());
    results.extend(validate_negotiation(verbose));
    results.extend(validate_office());

    // 7. Task wizards
    results.extend(validate_wizards());

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Scoring Rules ────────────────────────────────────────────────────

fn validate_scoring_rules(verbose: bool) -> Vec<TestResult> {
    println!("--- Scoring Rules ---");
    let mut results = Vec::new();
    let roster = government_roster();
    let rules = government_rules();

    let missing = rules.missing_for(&roster);
    results.push(check(
        "rules_cover_roster",
        missing.is_empty(),
        if missing.is_empty() {
            format!("{} rules for {} stakeholders", rules.len(), roster.len())
        } else {
            format!("no rule for {}", missing.join(", "))
        },
    ));

    for (id, answer) in REFERENCE_ANSWERS {
        let Some(rule) = rules.get(id) else {
            continue;
        };
        let eval = evaluate(rule, answer, 1);
        if verbose {
            println!("    {}: {}", id, eval.feedback);
        }
        results.push(check(
            &format!("reference_answer_{}", id),
            eval.success,
            eval.feedback,
        ));

        let weak = evaluate(rule, WEAK_ANSWER, 1);
        results.push(check(
            &format!("weak_answer_rejected_{}", id),
            !weak.success && !weak.feedback.is_empty(),
            weak.feedback,
        ));
    }

    // Empty and whitespace input never succeed and always get feedback
    let empty_ok = rules.rules.iter().all(|r| {
        ["", "   \n\t"].iter().all(|t| {
            let e = evaluate(r, t, 1);
            !e.success && !e.feedback.is_empty()
        })
    });
    results.push(check(
        "empty_input_rejected",
        empty_ok,
        "blank submissions fail with feedback",
    ));

    // Later attempts are never easier than the first
    let mut loosened = Vec::new();
    for (id, answer) in REFERENCE_ANSWERS {
        if let Some(rule) = rules.get(id) {
            for attempt in 2..=4 {
                if evaluate(rule, answer, attempt).success && !evaluate(rule, answer, 1).success {
                    loosened.push(format!("{}@{}", id, attempt));
                }
            }
        }
    }
    results.push(check(
        "overrides_only_tighten",
        loosened.is_empty(),
        if loosened.is_empty() {
            "no attempt accepts what attempt 1 rejects".to_string()
        } else {
            format!("loosened: {}", loosened.join(", "))
        },
    ));

    results
}

// ── 2. Government Scenario ──────────────────────────────────────────────

fn validate_government_scenario(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Government Scenario ---");
    let mut results = Vec::new();

    // Perfect run
    let mut session = GovernmentSession::from_config(config, CompletionHook::none());
    session.begin();
    let mut transitions = Vec::new();
    for (_, answer) in REFERENCE_ANSWERS {
        transitions.extend(session.respond(answer));
    }
    let all_succeeded = transitions.iter().all(|t| *t == Transition::Succeeded);
    let agg = session.aggregate();
    results.push(check(
        "perfect_run_passes",
        all_succeeded && agg.passed && agg.successes == 5,
        format!(
            "{} successes in {} attempts, passed={}",
            agg.successes, agg.total_attempts, agg.passed
        ),
    ));

    // Every stakeholder exhausted
    let mut session = GovernmentSession::from_config(config, CompletionHook::none());
    session.begin();
    let mut guard = 0;
    while !session.scenario().is_complete() && guard < 50 {
        session.respond(WEAK_ANSWER);
        guard += 1;
    }
    let agg = session.aggregate();
    let expected_attempts: u32 = government_roster().iter().map(|e| e.max_attempts).sum();
    results.push(check(
        "all_weak_exhausts_every_attempt",
        !agg.passed && agg.failures == 5 && agg.total_attempts == expected_attempts,
        format!(
            "{} failures, {}/{} attempts",
            agg.failures, agg.total_attempts, expected_attempts
        ),
    ));
    results.push(check(
        "input_after_results_ignored",
        session.respond(WEAK_ANSWER).is_none(),
        "no transition once results are shown",
    ));

    // Threshold boundary: exactly threshold successes passes, one fewer fails
    let threshold = config.government_pass_threshold;
    for wins in [threshold.saturating_sub(1), threshold] {
        let mut session = GovernmentSession::from_config(config, CompletionHook::none());
        session.begin();
        let mut guard = 0;
        while !session.scenario().is_complete() && guard < 50 {
            let index = match session.scenario().phase() {
                careersim_logic::scenario::Phase::Interaction { index } => index,
                _ => break,
            };
            let text = if index < wins {
                REFERENCE_ANSWERS[index].1
            } else {
                WEAK_ANSWER
            };
            session.respond(text);
            guard += 1;
        }
        let agg = session.aggregate();
        let expect_pass = wins >= threshold;
        if verbose {
            println!(
                "    {} wins vs threshold {}: passed={}",
                agg.successes, threshold, agg.passed
            );
        }
        results.push(check(
            &format!("threshold_{}_wins", wins),
            agg.passed == expect_pass && agg.successes == wins,
            format!("{} successes, passed={}", agg.successes, agg.passed),
        ));
    }

    results
}

// ── 3. Experiment Model ─────────────────────────────────────────────────

fn validate_experiment_model(verbose: bool) -> Vec<TestResult> {
    println!("--- Experiment Model ---");
    let mut results = Vec::new();
    let goal = SimConfig::default().goal();

    let temperatures = [20.0, 600.0, 900.0, 940.0, 980.0, 1100.0, 1200.0];
    let times = [0.5, 6.0, 12.0, 18.0, 24.0, 72.0];

    let mut combos = 0;
    let mut out_of_range = 0;
    let mut reaching_goal = 0;
    let mut best = f32::MIN;
    let mut noise = HashNoise::new(12345);

    for precursor in Precursor::ALL {
        for cooling in CoolingMethod::ALL {
            for additive in Additive::ALL {
                for &temperature_c in &temperatures {
                    for &time_hours in &times {
                        let vars = ExperimentVariables {
                            precursor,
                            temperature_c,
                            time_hours,
                            cooling,
                            additive,
                        };
                        if !validate_variables(&vars).is_empty() {
                            continue;
                        }
                        combos += 1;
                        best = best.max(raw_purity(&vars));
                        for out in [
                            run_experiment(&vars, &mut NoNoise),
                            run_experiment(&vars, &mut noise),
                        ] {
                            let purity_ok =
                                (PURITY_RANGE.0..=PURITY_RANGE.1).contains(&out.purity);
                            let lev_ok = (LEVITATION_RANGE.0..=LEVITATION_RANGE.1)
                                .contains(&out.levitation_height);
                            if !purity_ok || !lev_ok {
                                out_of_range += 1;
                            }
                        }
                        if evaluate_run(&run_experiment(&vars, &mut NoNoise), &goal).success {
                            reaching_goal += 1;
                        }
                    }
                }
            }
        }
    }

    results.push(check(
        "outputs_clamped",
        out_of_range == 0,
        format!("{} combinations, {} outputs out of range", combos, out_of_range),
    ));

    let optimal = ExperimentVariables::optimal();
    results.push(check(
        "optimal_is_best",
        (raw_purity(&optimal) - best).abs() < f32::EPSILON,
        format!("optimal raw purity {:.1}, best seen {:.1}", raw_purity(&optimal), best),
    ));

    let share = reaching_goal as f32 / combos.max(1) as f32;
    if verbose {
        println!(
            "    {}/{} combinations reach the goal ({:.1}%)",
            reaching_goal,
            combos,
            share * 100.0
        );
    }
    results.push(check(
        "goal_is_selective",
        reaching_goal > 0 && share < 0.25,
        format!("{:.1}% of combinations reach the goal", share * 100.0),
    ));

    let default_out = run_experiment(&ExperimentVariables::default(), &mut NoNoise);
    results.push(check(
        "default_settings_fall_short",
        !evaluate_run(&default_out, &goal).success,
        format!(
            "purity {:.1}, levitation {:.2}",
            default_out.purity, default_out.levitation_height
        ),
    ));

    results
}

// ── 4. Lab Session ──────────────────────────────────────────────────────

fn validate_lab_session(
    config: &SimConfig,
    export_csv: Option<&PathBuf>,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Lab Session ---");
    let mut results = Vec::new();

    let store: Box<dyn KeyValueStore> = match &config.data_dir {
        Some(dir) => match FileStore::open(dir) {
            Ok(s) => Box::new(s),
            Err(e) => {
                log::warn!("falling back to memory store: {}", e);
                Box::new(MemoryStore::new())
            }
        },
        None => Box::new(MemoryStore::new()),
    };
    let existing = careersim_core::notebook::LabNotebook::load(store.as_ref()).len();

    let mut lab = MaterialsLab::open(store, config.session_noise(), config, CompletionHook::none());
    lab.begin();
    lab.set_hypothesis("Slow cooling with a silver oxide dopant maximises purity");

    let plan = [
        (ExperimentVariables::default(), "baseline furnace settings"),
        (ExperimentVariables::optimal(), "optimal window, slow cooling, Ag₂O"),
    ];
    let mut runs = Vec::new();
    for (vars, comment) in plan {
        match lab.run(vars, comment) {
            Ok(run) => {
                if verbose {
                    println!("    {}", run.evaluation.feedback);
                }
                runs.push(run);
            }
            Err(e) => {
                if verbose {
                    println!("    run refused: {}", e);
                }
            }
        }
    }

    let succeeded = runs.iter().any(|r| r.transition == Transition::Succeeded);
    results.push(check(
        "lab_optimal_run_succeeds",
        succeeded && lab.completion().map(|p| p.passed).unwrap_or(false),
        format!("{} runs, completion={}", runs.len(), lab.completion().is_some()),
    ));
    if let Some(payload) = lab.completion() {
        let json = serde_json::to_value(payload);
        let shaped = json
            .as_ref()
            .map(|v| v[LAB_ENTITY_ID].is_string() && v["completedAt"].is_string())
            .unwrap_or(false);
        results.push(check(
            "lab_payload_json",
            shaped,
            match &json {
                Ok(v) => format!("{} top-level keys", v.as_object().map_or(0, |o| o.len())),
                Err(e) => e.to_string(),
            },
        ));
        if verbose {
            if let Ok(text) = serde_json::to_string_pretty(payload) {
                println!("{}", text);
            }
        }
    }
    results.push(check(
        "lab_notebook_records_runs",
        lab.notebook().len() == existing + runs.len(),
        format!("{} entries", lab.notebook().len()),
    ));

    let csv = lab.export_csv();
    results.push(check(
        "lab_csv_rows",
        csv.lines().count() == lab.notebook().len() + 1,
        format!("{} lines", csv.lines().count()),
    ));

    if let Some(path) = export_csv {
        let written = std::fs::write(path, &csv);
        results.push(check(
            "lab_csv_export",
            written.is_ok(),
            match written {
                Ok(()) => format!("wrote {}", path.display()),
                Err(e) => format!("{}: {}", path.display(), e),
            },
        ));
    }

    results
}

// ── 5. Snapshots ────────────────────────────────────────────────────────

fn validate_snapshots(config: &SimConfig) -> Vec<TestResult> {
    println!("--- Session Snapshots ---");
    let mut session = GovernmentSession::from_config(config, CompletionHook::none());
    session.begin();
    session.respond(REFERENCE_ANSWERS[0].1);
    session.respond(WEAK_ANSWER);

    let mut bytes = Vec::new();
    let roundtrip = save_snapshot(&mut bytes, &session.snapshot())
        .and_then(|_| load_snapshot(&mut bytes.as_slice()));
    let detail = match &roundtrip {
        Ok(s) => format!("{} bytes, phase {:?}", bytes.len(), s.scenario.phase()),
        Err(e) => e.to_string(),
    };
    let passed = roundtrip
        .map(|s| &s.scenario == session.scenario())
        .unwrap_or(false);

    vec![check("snapshot_roundtrip", passed, detail)]
}

// ── 6. Mini-games ───────────────────────────────────────────────────────

fn validate_quiz() -> Vec<TestResult> {
    println!("--- Element Quiz ---");
    let elements = standard_elements();
    let n = elements.len();
    let pairs: Vec<(String, String)> = elements
        .iter()
        .map(|e| (e.symbol.clone(), e.name.clone()))
        .collect();

    let mut quiz = MatchingQuiz::new(elements, (0..n).rev().collect());
    quiz.answer(&pairs[0].0, "Unobtainium");
    let all_correct = pairs
        .iter()
        .all(|(s, name)| quiz.answer(s, &name.to_uppercase()) == MatchResult::Correct);

    vec![
        check(
            "quiz_all_matchable",
            all_correct && quiz.finished(),
            format!("{} elements", n),
        ),
        check(
            "quiz_one_mistake_passes",
            quiz.mistakes() == 1 && quiz.passed(),
            format!("accuracy {:.2}", quiz.accuracy()),
        ),
    ]
}

/// Every ending reachable from the current node, depth first.
fn reachable_endings(negotiation: &Negotiation, found: &mut Vec<Ending>) {
    if let Some(ending) = negotiation.outcome() {
        if !found.contains(&ending) {
            found.push(ending);
        }
        return;
    }
    let choices = negotiation.current().map(|n| n.choices.len()).unwrap_or(0);
    for i in 0..choices {
        let mut branch = negotiation.clone();
        if branch.choose(i).is_ok() {
            reachable_endings(&branch, found);
        }
    }
}

fn validate_negotiation(verbose: bool) -> Vec<TestResult> {
    println!("--- Budget Negotiation ---");
    let tree = budget_negotiation();
    let issues = validate_tree(&tree);

    let mut endings = Vec::new();
    reachable_endings(&Negotiation::new(tree), &mut endings);
    if verbose {
        println!("    reachable endings: {:?}", endings);
    }

    vec![
        check(
            "negotiation_tree_valid",
            issues.is_empty(),
            format!("{} issues", issues.len()),
        ),
        check(
            "negotiation_all_endings_reachable",
            [Ending::Agreement, Ending::Compromise, Ending::Walkout]
                .iter()
                .all(|e| endings.contains(e)),
            format!("{:?}", endings),
        ),
    ]
}

fn validate_office() -> Vec<TestResult> {
    println!("--- Office Navigation ---");
    let mut walk = OfficeWalk::new(standard_office(), rooms::LOBBY);
    let targets = [
        rooms::MARKETING_SUITE,
        rooms::FINANCE_OFFICE,
        rooms::GOVERNMENT_AFFAIRS,
        rooms::MATERIALS_LAB,
        rooms::BREAK_ROOM,
    ];
    let unreachable: Vec<u32> = targets
        .iter()
        .copied()
        .filter(|&room| walk.route_to(room).is_err())
        .collect();
    let tracks = walk.unlocked_tracks();

    vec![
        check(
            "office_rooms_reachable",
            unreachable.is_empty(),
            format!("{} steps walked, unreachable {:?}", walk.steps(), unreachable),
        ),
        check(
            "office_all_tracks_unlocked",
            Track::ALL.iter().all(|t| tracks.contains(t)),
            format!("{:?}", tracks),
        ),
    ]
}

// ── 7. Task Wizards ─────────────────────────────────────────────────────

fn validate_wizards() -> Vec<TestResult> {
    println!("--- Task Wizards ---");
    let mut wizard = marketing_campaign_brief();
    let blocked = wizard.advance().is_err();

    wizard.set_answer("target_audience", "Commuters aged 25-40");
    wizard.set_answer("channel", "Social Media");
    wizard.set_answer("key_message", "Get to work greener and faster");
    wizard.set_answer("budget", "12000");
    while !wizard.is_last_step() {
        if wizard.advance().is_err() {
            break;
        }
    }
    let finished = wizard.finish();

    vec![
        check("wizard_blocks_empty_step", blocked, "empty first step refused"),
        check(
            "wizard_completes",
            finished.is_ok(),
            match &finished {
                Ok(sub) => format!("{} answers", sub.answers.len()),
                Err(issues) => format!("{} issues", issues.len()),
            },
        ),
    ]
}
