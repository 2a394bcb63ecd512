//! Numeric threshold and terminal-error predicates.
//!
//! Threshold checks are strict `<` comparisons against the trace's summary
//! fields.

use crate::predicate::Verdict;
use crate::trace::model::Trace;

/// Total cost is strictly under `limit` dollars.
#[must_use]
pub fn cost_under(trace: &Trace, limit: f64) -> Verdict {
    let cost = trace.total_cost;
    if cost < limit {
        Verdict::pass(format!("Total cost ${cost:.4} is under limit ${limit:.4}."))
    } else {
        Verdict::fail(format!("Total cost ${cost:.4} exceeds limit ${limit:.4}."))
    }
}

/// Total token usage is strictly under `limit`.
#[must_use]
pub fn tokens_under(trace: &Trace, limit: u64) -> Verdict {
    let tokens = trace.total_tokens;
    if tokens < limit {
        Verdict::pass(format!("Total tokens {tokens} are under limit {limit}."))
    } else {
        Verdict::fail(format!("Total tokens {tokens} exceed limit {limit}."))
    }
}

/// Wall-clock duration is strictly under `limit` seconds.
#[must_use]
pub fn duration_under(trace: &Trace, limit: f64) -> Verdict {
    let duration = trace.duration_seconds;
    if duration < limit {
        Verdict::pass(format!("Duration {duration:.2}s is under limit {limit:.2}s."))
    } else {
        Verdict::fail(format!("Duration {duration:.2}s exceeds limit {limit:.2}s."))
    }
}

/// Model-call count is strictly under `limit`.
#[must_use]
pub fn llm_calls_under(trace: &Trace, limit: usize) -> Verdict {
    let calls = trace.llm_calls;
    if calls < limit {
        Verdict::pass(format!("Number of LLM calls {calls} is under limit {limit}."))
    } else {
        Verdict::fail(format!("Number of LLM calls {calls} exceeds limit {limit}."))
    }
}

/// The trial finished without a terminal error.
#[must_use]
pub fn succeeded(trace: &Trace) -> Verdict {
    match &trace.error {
        None => Verdict::pass("Agent execution succeeded."),
        Some(error) => Verdict::fail(format!(
            "Agent execution failed with error: {}",
            error.message
        )),
    }
}

/// The trial ended with a terminal error.
#[must_use]
pub fn failed(trace: &Trace) -> Verdict {
    match &trace.error {
        Some(error) => Verdict::pass(format!(
            "Agent execution failed as expected with error: {}",
            error.message
        )),
        None => Verdict::fail("Agent execution succeeded but was expected to fail."),
    }
}

/// The terminal error carries the given `ATH-xxxx` code.
#[must_use]
pub fn error_code_is(trace: &Trace, code: &str) -> Verdict {
    match &trace.error {
        None => Verdict::fail(format!("Agent succeeded, expected error with code {code}.")),
        Some(error) if error.code == code => {
            Verdict::pass(format!("Agent failed with expected error code: {code}"))
        }
        Some(error) => Verdict::fail(format!(
            "Agent failed with code {}, expected {code}.",
            error.code
        )),
    }
}
