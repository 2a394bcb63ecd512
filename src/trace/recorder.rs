//! Thread-synchronized event accumulator for one trial's execution window.
//!
//! Mock invocations may originate from different threads inside the
//! execution adapter, so every append goes through a mutex. The recorder is
//! exclusively owned by one trial (shared across that trial's threads via
//! `Arc`) and is never reused across trials.

use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::core::errors::{HarnessError, Result};
use crate::trace::event::{EventBody, ToolArgs, TraceEvent};
use crate::trace::model::{Trace, TraceError};

/// An appended event awaiting commit-time ordering.
struct PendingEvent {
    timestamp: DateTime<Utc>,
    body: EventBody,
}

struct OpenState {
    run_id: Uuid,
    input: String,
    started: Instant,
    pending: Vec<PendingEvent>,
    total_tokens: u64,
    total_cost: f64,
    llm_calls: usize,
}

enum RecorderState {
    Open(OpenState),
    Finalized,
}

/// Accumulates events during one trial and finalizes into an immutable
/// [`Trace`].
///
/// Lifecycle: `open() → record_*()* → finalize()`. Appends after `finalize`
/// and a second `finalize` fail with [`HarnessError::RecorderFinalized`] —
/// that is adapter misuse, not a recoverable trial failure.
pub struct TraceRecorder {
    state: Mutex<RecorderState>,
}

impl TraceRecorder {
    /// Open a fresh recorder for one trial.
    #[must_use]
    pub fn open(input: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(RecorderState::Open(OpenState {
                run_id: Uuid::new_v4(),
                input: input.into(),
                started: Instant::now(),
                pending: Vec::new(),
                total_tokens: 0,
                total_cost: 0.0,
                llm_calls: 0,
            })),
        }
    }

    /// Append a tool-call event.
    pub fn record_tool_call(
        &self,
        name: &str,
        args: ToolArgs,
        result: Option<Value>,
        error: Option<String>,
    ) -> Result<()> {
        self.append(EventBody::ToolCall {
            name: name.to_string(),
            args,
            result,
            error,
        })
    }

    /// Append a model-call event and fold its tokens/cost into the totals.
    pub fn record_model_call(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost: f64,
    ) -> Result<()> {
        let mut guard = self.state.lock();
        let RecorderState::Open(open) = &mut *guard else {
            return Err(HarnessError::RecorderFinalized {
                operation: "record_model_call",
            });
        };
        open.total_tokens += prompt_tokens + completion_tokens;
        open.total_cost += cost;
        open.llm_calls += 1;
        open.pending.push(PendingEvent {
            timestamp: Utc::now(),
            body: EventBody::ModelCall {
                model: model.to_string(),
                prompt_tokens,
                completion_tokens,
                cost,
            },
        });
        Ok(())
    }

    /// Append a state-change event.
    pub fn record_state_change(
        &self,
        key: &str,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Result<()> {
        self.append(EventBody::StateChange {
            key: key.to_string(),
            old_value,
            new_value,
        })
    }

    fn append(&self, body: EventBody) -> Result<()> {
        let mut guard = self.state.lock();
        let RecorderState::Open(open) = &mut *guard else {
            return Err(HarnessError::RecorderFinalized {
                operation: "append",
            });
        };
        open.pending.push(PendingEvent {
            timestamp: Utc::now(),
            body,
        });
        Ok(())
    }

    /// Freeze the buffer into an immutable [`Trace`].
    ///
    /// Events are ordered by `(timestamp, arrival order)` — the sort is
    /// stable, so same-timestamp events keep their arrival order — and
    /// sequence indices are assigned contiguously from 0.
    pub fn finalize(
        &self,
        final_output: Option<String>,
        error: Option<TraceError>,
    ) -> Result<Trace> {
        let mut guard = self.state.lock();
        let state = std::mem::replace(&mut *guard, RecorderState::Finalized);
        let RecorderState::Open(open) = state else {
            return Err(HarnessError::RecorderFinalized {
                operation: "finalize",
            });
        };

        let mut pending = open.pending;
        pending.sort_by_key(|e| e.timestamp);
        let events = pending
            .into_iter()
            .enumerate()
            .map(|(index, e)| TraceEvent {
                index,
                timestamp: e.timestamp,
                body: e.body,
            })
            .collect();

        Ok(Trace {
            run_id: open.run_id,
            input: open.input,
            events,
            final_output,
            total_tokens: open.total_tokens,
            total_cost: open.total_cost,
            duration_seconds: open.started.elapsed().as_secs_f64(),
            llm_calls: open.llm_calls,
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn events_get_contiguous_indices() {
        let rec = TraceRecorder::open("input");
        rec.record_tool_call("a", ToolArgs::new(), Some(json!(1)), None)
            .expect("append");
        rec.record_model_call("m", 10, 5, 0.01).expect("append");
        rec.record_state_change("k", None, Some(json!("v")))
            .expect("append");

        let trace = rec.finalize(Some("done".to_string()), None).expect("finalize");
        let indices: Vec<usize> = trace.events.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        for pair in trace.events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn totals_accumulate_from_model_calls() {
        let rec = TraceRecorder::open("input");
        rec.record_model_call("m", 100, 20, 0.5).expect("append");
        rec.record_model_call("m", 50, 10, 0.25).expect("append");

        let trace = rec.finalize(None, None).expect("finalize");
        assert_eq!(trace.total_tokens, 180);
        assert_eq!(trace.llm_calls, 2);
        assert!((trace.total_cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn append_after_finalize_is_programming_error() {
        let rec = TraceRecorder::open("input");
        rec.finalize(None, None).expect("finalize");
        let err = rec
            .record_tool_call("a", ToolArgs::new(), None, None)
            .expect_err("must fail");
        assert_eq!(err.code(), "ATH-3002");
    }

    #[test]
    fn double_finalize_is_programming_error() {
        let rec = TraceRecorder::open("input");
        rec.finalize(None, None).expect("first finalize");
        let err = rec.finalize(None, None).expect_err("must fail");
        assert_eq!(err.code(), "ATH-3002");
    }

    #[test]
    fn concurrent_appends_are_all_committed() {
        let rec = Arc::new(TraceRecorder::open("input"));
        let mut handles = Vec::new();
        for t in 0..4 {
            let rec = Arc::clone(&rec);
            handles.push(thread::spawn(move || {
                for i in 0..25 {
                    rec.record_tool_call(
                        &format!("tool_{t}"),
                        ToolArgs::from([("i".to_string(), json!(i))]),
                        None,
                        None,
                    )
                    .expect("append");
                }
            }));
        }
        for h in handles {
            h.join().expect("join");
        }

        let trace = rec.finalize(None, None).expect("finalize");
        assert_eq!(trace.events.len(), 100);
        let indices: Vec<usize> = trace.events.iter().map(|e| e.index).collect();
        assert_eq!(indices, (0..100).collect::<Vec<_>>());
        for pair in trace.events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
