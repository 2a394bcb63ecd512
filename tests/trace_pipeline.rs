//! Trace pipeline integration: record, finalize, render, and export, plus
//! property checks over the recorder's ordering guarantees.

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use serde_json::json;

use agent_trial_harness::core::config::FormatConfig;
use agent_trial_harness::trace::event::{EventBody, ToolArgs};
use agent_trial_harness::trace::format::{Highlights, TraceFormatter};
use agent_trial_harness::trace::model::{Trace, TraceError};
use agent_trial_harness::trace::recorder::TraceRecorder;

#[test]
fn record_finalize_render_export_round_trip() {
    let recorder = TraceRecorder::open("find the answer");
    recorder
        .record_tool_call(
            "search",
            ToolArgs::from([("query".to_string(), json!("answer"))]),
            Some(json!(["doc1", "doc2"])),
            None,
        )
        .expect("record");
    recorder
        .record_model_call("gpt-4o-mini", 150, 30, 0.003)
        .expect("record");
    recorder
        .record_state_change("phase", Some(json!("search")), Some(json!("answer")))
        .expect("record");

    let trace = recorder
        .finalize(Some("42".to_string()), None)
        .expect("finalize");
    assert_eq!(trace.events.len(), 3);
    assert_eq!(trace.call_order(), vec!["search"]);
    assert_eq!(trace.total_tokens, 180);
    assert_eq!(trace.llm_calls, 1);
    assert!(trace.succeeded());

    let rendered = TraceFormatter::default().format(&trace);
    assert!(rendered.starts_with("Actual trace (3 events):"));
    assert!(rendered.contains("[tool]  search(query=answer)"));
    assert!(rendered.contains("[model] gpt-4o-mini (180 tokens, $0.0030)"));
    assert!(rendered.contains("[state] phase: search -> answer"));

    let raw = trace.to_json().expect("export");
    let parsed = Trace::from_json(&raw).expect("import");
    assert_eq!(trace, parsed);
}

#[test]
fn terminal_error_survives_export() {
    let recorder = TraceRecorder::open("doomed");
    let trace = recorder
        .finalize(
            None,
            Some(TraceError {
                code: "ATH-2101".to_string(),
                message: "trial exceeded 5s timeout".to_string(),
            }),
        )
        .expect("finalize");
    assert!(!trace.succeeded());

    let parsed = Trace::from_json(&trace.to_json().expect("export")).expect("import");
    assert_eq!(
        parsed.error.expect("error").code,
        "ATH-2101"
    );
}

#[test]
fn accumulated_float_costs_survive_export() {
    // Eleven $0.001 calls sum to 0.011000000000000003, a value whose
    // shortest decimal rendering must re-parse to the same f64 bits.
    let recorder = TraceRecorder::open("pricey");
    for _ in 0..11 {
        recorder
            .record_model_call("m", 10, 5, 0.001)
            .expect("record");
    }
    let trace = recorder.finalize(None, None).expect("finalize");

    let parsed = Trace::from_json(&trace.to_json().expect("export")).expect("import");
    assert_eq!(
        trace.total_cost.to_bits(),
        parsed.total_cost.to_bits(),
        "total_cost must survive JSON bit-for-bit"
    );
    assert_eq!(trace, parsed);
}

#[test]
fn highlighted_render_pins_the_implicated_window() {
    let recorder = TraceRecorder::open("long run");
    for i in 0..40 {
        recorder
            .record_tool_call(&format!("step_{i}"), ToolArgs::new(), Some(json!(i)), None)
            .expect("record");
    }
    let trace = recorder.finalize(None, None).expect("finalize");

    let formatter = TraceFormatter::new(&FormatConfig::default());
    let highlights = Highlights::from([(20, "wrong turn here".to_string())]);
    let rendered = formatter.format_with_highlights(&trace, &highlights);
    assert!(rendered.contains("21. [tool]  step_20(") && rendered.contains("<-- wrong turn here"));
    assert!(rendered.contains("events omitted"));
    // Edges always survive.
    assert!(rendered.contains("1. [tool]  step_0("));
    assert!(rendered.contains("40. [tool]  step_39("));
}

proptest! {
    #[test]
    fn finalized_indices_are_contiguous_and_ordered(
        per_thread in 1usize..40,
        threads in 1usize..5,
    ) {
        let recorder = Arc::new(TraceRecorder::open("prop"));
        thread::scope(|scope| {
            for t in 0..threads {
                let recorder = Arc::clone(&recorder);
                scope.spawn(move || {
                    for i in 0..per_thread {
                        recorder
                            .record_tool_call(
                                &format!("t{t}"),
                                ToolArgs::from([("i".to_string(), json!(i))]),
                                None,
                                None,
                            )
                            .expect("append");
                    }
                });
            }
        });

        let trace = recorder.finalize(None, None).expect("finalize");
        prop_assert_eq!(trace.events.len(), per_thread * threads);
        for (expected, event) in trace.events.iter().enumerate() {
            prop_assert_eq!(event.index, expected);
        }
        for pair in trace.events.windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn json_round_trip_preserves_any_event_mix(
        kinds in proptest::collection::vec(0u8..3, 0..25),
    ) {
        let recorder = TraceRecorder::open("mix");
        for (i, kind) in kinds.iter().enumerate() {
            match kind {
                0 => recorder
                    .record_tool_call(
                        &format!("tool_{i}"),
                        ToolArgs::from([("n".to_string(), json!(i))]),
                        Some(json!({"ok": true})),
                        None,
                    )
                    .expect("append"),
                1 => recorder
                    .record_model_call("m", i as u64, 1, 0.001)
                    .expect("append"),
                _ => recorder
                    .record_state_change(&format!("k{i}"), None, Some(json!(i)))
                    .expect("append"),
            }
        }
        let trace = recorder
            .finalize(Some("done".to_string()), None)
            .expect("finalize");
        let parsed = Trace::from_json(&trace.to_json().expect("export")).expect("import");

        // Event kinds survive the tagged representation.
        let tool_calls = kinds.iter().filter(|k| **k == 0).count();
        prop_assert_eq!(parsed.tool_calls().count(), tool_calls);
        prop_assert_eq!(trace, parsed);
    }
}

#[test]
fn event_bodies_use_tagged_serialization() {
    let recorder = TraceRecorder::open("tagged");
    recorder
        .record_tool_call("t", ToolArgs::new(), Some(json!(1)), None)
        .expect("append");
    let trace = recorder.finalize(None, None).expect("finalize");
    let raw = trace.to_json().expect("export");
    assert!(raw.contains("\"kind\": \"tool_call\""));

    let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");
    assert_eq!(value["events"][0]["index"], json!(0));
    match &trace.events[0].body {
        EventBody::ToolCall { name, .. } => assert_eq!(name, "t"),
        other => panic!("expected tool call, got {other:?}"),
    }
}
