//! Predicates over the trial's final output.
//!
//! All output predicates are null-safe: a missing `final_output` makes every
//! positive check a plain `false` verdict, never an error.

use regex::Regex;

use crate::predicate::Verdict;
use crate::trace::model::Trace;

const NO_OUTPUT: &str = "Agent produced no output (final_output is null).";

/// The final output matches `text` exactly.
#[must_use]
pub fn output_equals(trace: &Trace, text: &str) -> Verdict {
    let Some(output) = trace.final_output.as_deref() else {
        return Verdict::fail(NO_OUTPUT);
    };
    if output == text {
        Verdict::pass(format!("Agent output matches exactly: '{text}'"))
    } else {
        Verdict::fail(format!(
            "Agent output does NOT match. Expected: '{text}', Actual: '{output}'"
        ))
    }
}

/// The final output contains `text`.
#[must_use]
pub fn output_contains(trace: &Trace, text: &str) -> Verdict {
    let Some(output) = trace.final_output.as_deref() else {
        return Verdict::fail(NO_OUTPUT);
    };
    if output.contains(text) {
        Verdict::pass(format!("Agent output contains: '{text}'"))
    } else {
        Verdict::fail(format!("Agent output does NOT contain: '{text}'"))
    }
}

/// The final output does not contain `text`.
///
/// A missing output trivially contains nothing, so this passes on `null`.
#[must_use]
pub fn output_not_contains(trace: &Trace, text: &str) -> Verdict {
    match trace.final_output.as_deref() {
        Some(output) if output.contains(text) => Verdict::fail(format!(
            "Agent output contains '{text}' but expected not to."
        )),
        _ => Verdict::pass(format!("Agent output does not contain: '{text}'")),
    }
}

/// The final output matches the regex `pattern` (unanchored search).
///
/// An invalid pattern is a failing verdict that says so — predicates never
/// raise.
#[must_use]
pub fn output_matches(trace: &Trace, pattern: &str) -> Verdict {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(error) => {
            return Verdict::fail(format!("Invalid output pattern '{pattern}': {error}"));
        }
    };
    let Some(output) = trace.final_output.as_deref() else {
        return Verdict::fail(NO_OUTPUT);
    };
    if regex.is_match(output) {
        Verdict::pass(format!("Agent output matches pattern: '{pattern}'"))
    } else {
        Verdict::fail(format!("Agent output does NOT match pattern: '{pattern}'"))
    }
}
