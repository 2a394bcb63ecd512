//! Query and assert API over a finalized trace.
//!
//! The boolean accessors answer without failing; the `assert_*` family
//! converts a failing verdict into [`HarnessError::AssertionFailed`] with
//! the rendered trace attached, highlighting the implicated events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::core::config::FormatConfig;
use crate::core::errors::{HarnessError, Result};
use crate::predicate::{Verdict, limits, output, tool_calls};
use crate::trace::event::{EventBody, ToolArgs};
use crate::trace::format::TraceFormatter;
use crate::trace::model::{Trace, TraceError};

/// One recorded invocation of a mocked tool.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub args: ToolArgs,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The result of one trial run, wrapping its immutable trace.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    trace: Arc<Trace>,
    formatter: TraceFormatter,
}

impl RunOutcome {
    #[must_use]
    pub fn new(trace: Arc<Trace>, format: &FormatConfig) -> Self {
        Self {
            trace,
            formatter: TraceFormatter::new(format),
        }
    }

    #[must_use]
    pub fn trace(&self) -> &Arc<Trace> {
        &self.trace
    }

    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.trace.final_output.as_deref()
    }

    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.trace.total_cost
    }

    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.trace.total_tokens
    }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.trace.duration_seconds
    }

    #[must_use]
    pub fn llm_calls(&self) -> usize {
        self.trace.llm_calls
    }

    #[must_use]
    pub fn error(&self) -> Option<&TraceError> {
        self.trace.error.as_ref()
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.trace.succeeded()
    }

    // --- Query API ---

    /// All recorded calls to `name`, in commit order.
    #[must_use]
    pub fn calls(&self, name: &str) -> Vec<RecordedCall> {
        self.trace
            .events
            .iter()
            .filter_map(|event| match &event.body {
                EventBody::ToolCall {
                    name: call_name,
                    args,
                    result,
                    error,
                } if call_name == name => Some(RecordedCall {
                    args: args.clone(),
                    result: result.clone(),
                    error: error.clone(),
                    timestamp: event.timestamp,
                }),
                _ => None,
            })
            .collect()
    }

    /// The `n`th call to `name` (0-based). Requesting a call that never
    /// happened is caller misuse, not a trial verdict.
    pub fn call(&self, name: &str, n: usize) -> Result<RecordedCall> {
        let calls = self.calls(name);
        calls.get(n).cloned().ok_or_else(|| HarnessError::Runtime {
            details: format!(
                "tool '{name}' was called {} times, requested call index {n}",
                calls.len()
            ),
        })
    }

    /// Tool names in commit order.
    #[must_use]
    pub fn call_order(&self) -> Vec<&str> {
        self.trace.call_order()
    }

    // --- Boolean API ---

    #[must_use]
    pub fn tool_was_called(&self, name: &str) -> bool {
        tool_calls::tool_was_called(&self.trace, name).passed
    }

    #[must_use]
    pub fn tool_not_called(&self, name: &str) -> bool {
        tool_calls::tool_not_called(&self.trace, name).passed
    }

    #[must_use]
    pub fn tool_call_count(&self, name: &str, expected: usize) -> bool {
        tool_calls::tool_call_count(&self.trace, name, expected).passed
    }

    #[must_use]
    pub fn tool_called_with(&self, name: &str, expected: &ToolArgs) -> bool {
        tool_calls::tool_called_with(&self.trace, name, expected).passed
    }

    #[must_use]
    pub fn tool_called_with_partial(&self, name: &str, expected: &ToolArgs) -> bool {
        tool_calls::tool_called_with_partial(&self.trace, name, expected).passed
    }

    #[must_use]
    pub fn tool_called_before(&self, first: &str, second: &str) -> bool {
        tool_calls::tool_called_before(&self.trace, first, second).passed
    }

    #[must_use]
    pub fn tool_called_immediately_before(&self, first: &str, second: &str) -> bool {
        tool_calls::tool_called_immediately_before(&self.trace, first, second).passed
    }

    #[must_use]
    pub fn call_order_contains(&self, subsequence: &[&str]) -> bool {
        tool_calls::call_order_contains(&self.trace, subsequence).passed
    }

    #[must_use]
    pub fn output_equals(&self, text: &str) -> bool {
        output::output_equals(&self.trace, text).passed
    }

    #[must_use]
    pub fn output_contains(&self, text: &str) -> bool {
        output::output_contains(&self.trace, text).passed
    }

    #[must_use]
    pub fn output_matches(&self, pattern: &str) -> bool {
        output::output_matches(&self.trace, pattern).passed
    }

    // --- Assert API ---

    /// Turn a failing verdict into an assertion error carrying the rendered
    /// trace, with the implicated events highlighted.
    pub fn require(&self, verdict: Verdict) -> Result<()> {
        if verdict.passed {
            return Ok(());
        }
        let rendered = self
            .formatter
            .format_with_highlights(&self.trace, &verdict.highlights);
        Err(HarnessError::AssertionFailed {
            message: format!("{}\n\n{rendered}", verdict.message),
        })
    }

    pub fn assert_tool_was_called(&self, name: &str) -> Result<()> {
        self.require(tool_calls::tool_was_called(&self.trace, name))
    }

    pub fn assert_tool_not_called(&self, name: &str) -> Result<()> {
        self.require(tool_calls::tool_not_called(&self.trace, name))
    }

    pub fn assert_tool_call_count(&self, name: &str, expected: usize) -> Result<()> {
        self.require(tool_calls::tool_call_count(&self.trace, name, expected))
    }

    pub fn assert_tool_called_with(&self, name: &str, expected: &ToolArgs) -> Result<()> {
        self.require(tool_calls::tool_called_with(&self.trace, name, expected))
    }

    pub fn assert_tool_called_with_partial(&self, name: &str, expected: &ToolArgs) -> Result<()> {
        self.require(tool_calls::tool_called_with_partial(&self.trace, name, expected))
    }

    pub fn assert_tool_called_before(&self, first: &str, second: &str) -> Result<()> {
        self.require(tool_calls::tool_called_before(&self.trace, first, second))
    }

    pub fn assert_tool_called_immediately_before(&self, first: &str, second: &str) -> Result<()> {
        self.require(tool_calls::tool_called_immediately_before(
            &self.trace,
            first,
            second,
        ))
    }

    pub fn assert_call_order_contains(&self, subsequence: &[&str]) -> Result<()> {
        self.require(tool_calls::call_order_contains(&self.trace, subsequence))
    }

    pub fn assert_output_equals(&self, text: &str) -> Result<()> {
        self.require(output::output_equals(&self.trace, text))
    }

    pub fn assert_output_contains(&self, text: &str) -> Result<()> {
        self.require(output::output_contains(&self.trace, text))
    }

    pub fn assert_output_not_contains(&self, text: &str) -> Result<()> {
        self.require(output::output_not_contains(&self.trace, text))
    }

    pub fn assert_output_matches(&self, pattern: &str) -> Result<()> {
        self.require(output::output_matches(&self.trace, pattern))
    }

    pub fn assert_cost_under(&self, limit: f64) -> Result<()> {
        self.require(limits::cost_under(&self.trace, limit))
    }

    pub fn assert_tokens_under(&self, limit: u64) -> Result<()> {
        self.require(limits::tokens_under(&self.trace, limit))
    }

    pub fn assert_duration_under(&self, limit: f64) -> Result<()> {
        self.require(limits::duration_under(&self.trace, limit))
    }

    pub fn assert_llm_calls_under(&self, limit: usize) -> Result<()> {
        self.require(limits::llm_calls_under(&self.trace, limit))
    }

    pub fn assert_succeeded(&self) -> Result<()> {
        self.require(limits::succeeded(&self.trace))
    }

    pub fn assert_failed(&self) -> Result<()> {
        self.require(limits::failed(&self.trace))
    }

    pub fn assert_error_code_is(&self, code: &str) -> Result<()> {
        self.require(limits::error_code_is(&self.trace, code))
    }
}
