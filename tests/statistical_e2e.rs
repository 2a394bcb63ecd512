//! End-to-end statistical runs: a full agent loop over mocked tools,
//! repeated N times and aggregated under threshold and budget.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use agent_trial_harness::core::config::HarnessConfig;
use agent_trial_harness::core::errors::HarnessError;
use agent_trial_harness::mock::strategy::{ConditionalArm, ResponseStrategy};
use agent_trial_harness::runner::statistical::StatisticalRunner;
use agent_trial_harness::trace::event::ToolArgs;

fn config(trial_count: usize, threshold: f64, cost_budget: f64) -> HarnessConfig {
    let mut cfg = HarnessConfig::default();
    cfg.runner.trial_count = trial_count;
    cfg.runner.threshold = threshold;
    cfg.runner.cost_budget = cost_budget;
    cfg
}

fn arg(key: &str, value: serde_json::Value) -> ToolArgs {
    ToolArgs::from([(key.to_string(), value)])
}

#[test]
fn reliable_agent_passes_all_trials() {
    let runner = StatisticalRunner::new(config(10, 0.95, 5.0)).expect("runner");
    let result = runner
        .run("what is 6x7?", |ctx| {
            ctx.mocks()
                .register("calculator", ResponseStrategy::Static(json!(42)));
            let outcome = ctx.run_agent(|registry, input| {
                let answer = registry.invoke("calculator", arg("expr", json!(input)))?;
                registry.record_model_call("gpt-4o-mini", 120, 15, 0.002)?;
                Ok(Some(format!("the answer is {answer}")))
            })?;
            outcome.assert_tool_was_called("calculator")?;
            outcome.assert_output_contains("42")?;
            outcome.assert_cost_under(0.01)
        })
        .expect("run");

    assert_eq!(result.total_trials, 10);
    assert_eq!(result.passed, 10);
    assert!(result.overall_passed);
    assert!(result.failure_modes.is_empty());
    assert!(result.summary().contains("10/10 passed (100.0%)"));
    result.check_threshold().expect("threshold met");
}

#[test]
fn flaky_agent_fails_threshold_with_grouped_modes() {
    // Every third trial takes a wrong turn, deterministically.
    let trial_seq = AtomicUsize::new(0);
    let runner = StatisticalRunner::new(config(9, 0.95, 5.0)).expect("runner");
    let result = runner
        .run("look it up", |ctx| {
            let flaky = trial_seq.fetch_add(1, Ordering::SeqCst) % 3 == 2;
            ctx.mocks()
                .register("search", ResponseStrategy::Static(json!(["doc1"])));
            ctx.mocks()
                .register("guess", ResponseStrategy::Static(json!("maybe")));
            let outcome = ctx.run_agent(move |registry, input| {
                let tool = if flaky { "guess" } else { "search" };
                registry.invoke(tool, arg("q", json!(input)))?;
                Ok(Some("done".to_string()))
            })?;
            outcome.assert_tool_was_called("search")
        })
        .expect("run");

    assert_eq!(result.total_trials, 9);
    assert_eq!(result.failed, 3);
    assert!(!result.overall_passed);
    // Identical failures collapse into one mode keyed by the first line.
    assert_eq!(result.failure_modes.len(), 1);
    let (mode, count) = result.failure_modes.iter().next().expect("one mode");
    assert!(mode.contains("Tool 'search' was never called."));
    assert_eq!(*count, 3);
    // Failed trials keep their traces for diagnostics.
    assert_eq!(result.failed_traces.len(), 3);

    let err = result.check_threshold().expect_err("below threshold");
    assert_eq!(err.code(), "ATH-2103");
    assert!(err.to_string().contains("6/9 passed"));
}

#[test]
fn budget_overrun_aborts_before_pooled_trials() {
    // Calibration costs $0.50, so 10 trials estimate to $5.00 > $3.00.
    let executions = AtomicUsize::new(0);
    let runner = StatisticalRunner::new(config(10, 0.95, 3.0)).expect("runner");
    let err = runner
        .run("expensive question", |ctx| {
            executions.fetch_add(1, Ordering::SeqCst);
            let outcome = ctx.run_agent(|registry, _input| {
                registry.record_model_call("gpt-4o", 4000, 1000, 0.50)?;
                Ok(Some("pricey".to_string()))
            })?;
            outcome.assert_succeeded()
        })
        .expect_err("budget pre-flight must abort");

    let HarnessError::CostLimitExceeded {
        estimated_total,
        budget,
    } = &err
    else {
        panic!("expected CostLimitExceeded, got {err}");
    };
    assert!((estimated_total - 5.0).abs() < 1e-9);
    assert!((budget - 3.0).abs() < 1e-9);
    assert_eq!(
        executions.load(Ordering::SeqCst),
        1,
        "only the calibration trial may run"
    );
}

#[test]
fn trials_are_isolated_from_each_other() {
    // A two-item sequence consumed twice per trial. Any cursor leak across
    // trials would exhaust the mock on the second trial.
    let runner = StatisticalRunner::new(config(8, 1.0, 5.0)).expect("runner");
    let result = runner
        .run("step twice", |ctx| {
            ctx.mocks().register(
                "step",
                ResponseStrategy::Sequence(vec![json!("first"), json!("second")]),
            );
            let outcome = ctx.run_agent(|registry, _input| {
                let a = registry.invoke("step", ToolArgs::new())?;
                let b = registry.invoke("step", ToolArgs::new())?;
                Ok(Some(format!("{a} then {b}")))
            })?;
            outcome.assert_tool_call_count("step", 2)?;
            outcome.assert_output_equals("\"first\" then \"second\"")
        })
        .expect("run");

    assert_eq!(result.passed, 8);
    assert!(result.overall_passed);
}

#[test]
fn conditional_mock_drives_branching_agent() {
    let runner = StatisticalRunner::new(config(5, 1.0, 5.0)).expect("runner");
    let result = runner
        .run("route me", |ctx| {
            ctx.mocks().register(
                "lookup",
                ResponseStrategy::Conditional {
                    arms: vec![
                        ConditionalArm::new(
                            |a| a.get("kind") == Some(&json!("city")),
                            json!("Kyiv"),
                        ),
                        ConditionalArm::new(
                            |a| a.get("kind") == Some(&json!("river")),
                            json!("Dnipro"),
                        ),
                    ],
                    default: Some(json!("unknown")),
                },
            );
            let outcome = ctx.run_agent(|registry, _input| {
                let city = registry.invoke("lookup", arg("kind", json!("city")))?;
                let river = registry.invoke("lookup", arg("kind", json!("river")))?;
                let other = registry.invoke("lookup", arg("kind", json!("planet")))?;
                Ok(Some(format!("{city}/{river}/{other}")))
            })?;
            outcome.assert_output_equals("\"Kyiv\"/\"Dnipro\"/\"unknown\"")?;
            outcome.assert_tool_call_count("lookup", 3)
        })
        .expect("run");
    assert!(result.overall_passed);
}

#[test]
fn scripted_tool_failure_counts_as_trial_failure() {
    let runner = StatisticalRunner::new(config(4, 1.0, 5.0)).expect("runner");
    let result = runner
        .run("fetch it", |ctx| {
            ctx.mocks().register(
                "db",
                ResponseStrategy::Error("connection refused".to_string()),
            );
            let outcome = ctx.run_agent(|registry, _input| {
                registry.invoke("db", arg("query", json!("select 1")))?;
                Ok(Some("unreachable".to_string()))
            })?;
            outcome.assert_succeeded()
        })
        .expect("run");

    assert_eq!(result.failed, 4);
    assert!(!result.overall_passed);
    let (mode, _) = result.failure_modes.iter().next().expect("one mode");
    assert!(mode.contains("Agent execution failed with error"));
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let err = StatisticalRunner::new(config(0, 0.95, 5.0)).expect_err("zero trials");
    assert_eq!(err.code(), "ATH-1001");

    let err = StatisticalRunner::new(config(10, 1.5, 5.0)).expect_err("bad threshold");
    assert_eq!(err.code(), "ATH-1001");
}

#[test]
fn ordering_predicates_hold_across_every_trial() {
    let runner = StatisticalRunner::new(config(6, 1.0, 5.0)).expect("runner");
    let result = runner
        .run("multi-step task", |ctx| {
            ctx.mocks()
                .register("plan", ResponseStrategy::Static(json!("steps")));
            ctx.mocks()
                .register("execute", ResponseStrategy::Static(json!("ok")));
            ctx.mocks()
                .register("report", ResponseStrategy::Static(json!("sent")));
            let outcome = ctx.run_agent(|registry, _input| {
                registry.invoke("plan", ToolArgs::new())?;
                registry.invoke("execute", ToolArgs::new())?;
                registry.invoke("report", ToolArgs::new())?;
                Ok(Some("all done".to_string()))
            })?;
            outcome.assert_tool_called_before("plan", "execute")?;
            outcome.assert_tool_called_immediately_before("execute", "report")?;
            outcome.assert_call_order_contains(&["plan", "report"])?;
            outcome.assert_tool_not_called("delete_everything")
        })
        .expect("run");
    assert!(result.overall_passed);
}
