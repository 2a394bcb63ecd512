//! Aggregated outcome of one statistical run.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::{HarnessError, Result};
use crate::trace::model::Trace;

/// Immutable summary of one statistical run.
///
/// `total_trials` counts trials that actually ran; trials cancelled by
/// budget exhaustion are tallied separately in `cancelled` and excluded
/// from the pass-rate denominator.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticalResult {
    pub total_trials: usize,
    pub passed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// `passed / total_trials` in `[0, 1]`; 0.0 when nothing ran.
    pub pass_rate: f64,
    pub threshold: f64,
    pub overall_passed: bool,
    /// Distinct failure messages (first line) with occurrence counts.
    pub failure_modes: BTreeMap<String, usize>,
    /// Summed across every completed trial, calibration included.
    pub total_cost: f64,
    pub mean_duration_seconds: f64,
    pub mean_tokens: f64,
    /// True when the run was truncated by the mid-run budget check.
    pub budget_exhausted: bool,
    /// Traces of failed trials, kept for diagnostics. Successful-trial
    /// traces are discarded to bound memory.
    #[serde(skip)]
    pub failed_traces: Vec<Arc<Trace>>,
}

impl StatisticalResult {
    /// Multi-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let verdict = if self.overall_passed { "PASS" } else { "FAIL" };
        let mut lines = vec![
            format!(
                "Statistical result: {}/{} passed ({:.1}%), threshold {:.1}% -> {verdict}",
                self.passed,
                self.total_trials,
                self.pass_rate * 100.0,
                self.threshold * 100.0,
            ),
            format!("Total cost: ${:.4}", self.total_cost),
            format!(
                "Mean duration: {:.2}s, mean tokens: {:.0}",
                self.mean_duration_seconds, self.mean_tokens
            ),
        ];
        if self.cancelled > 0 {
            lines.push(format!(
                "Cancelled by budget: {} trials not started",
                self.cancelled
            ));
        }
        if !self.failure_modes.is_empty() {
            lines.push("Failure modes:".to_string());
            for (message, count) in &self.failure_modes {
                lines.push(format!("  {count}x {message}"));
            }
        }
        lines.join("\n")
    }

    /// Error out unless the pass rate met the threshold.
    pub fn check_threshold(&self) -> Result<()> {
        if self.overall_passed {
            return Ok(());
        }
        Err(HarnessError::ThresholdNotMet {
            passed: self.passed,
            total: self.total_trials,
            pass_rate: self.pass_rate * 100.0,
            threshold: self.threshold * 100.0,
            summary: self.summary(),
        })
    }
}
