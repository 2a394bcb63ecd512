//! ATH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::trace::model::Trace;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Top-level error type for the agent trial harness.
///
/// Variants split into two classes. *Assertion-class* errors describe a
/// deterministic, per-trial outcome (a mock ran dry, a predicate did not
/// hold) and are folded into statistical failure counts. Everything else is
/// either a configuration fault or a programming error and unwinds through
/// the orchestrator, cancelling unscheduled work.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("[ATH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ATH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ATH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ATH-2001] mock '{tool}' exhausted its response sequence after {calls_made} calls")]
    MockExhausted { tool: String, calls_made: usize },

    #[error("[ATH-2002] mock '{tool}' matched no condition for arguments: {args}")]
    NoMatchingCondition { tool: String, args: String },

    #[error("[ATH-2003] tool '{tool}' has no registered responder (registered: {registered:?})")]
    UnmockedTool {
        tool: String,
        registered: Vec<String>,
    },

    #[error("[ATH-2004] mock '{tool}' raised a scripted failure: {message}")]
    ToolFailure { tool: String, message: String },

    #[error("[ATH-2101] trial exceeded {seconds}s timeout")]
    TimeoutExceeded {
        seconds: f64,
        /// Everything recorded up to the deadline, for diagnostics.
        partial_trace: Option<Arc<Trace>>,
    },

    #[error("[ATH-2102] assertion failed: {message}")]
    AssertionFailed { message: String },

    #[error(
        "[ATH-2103] pass rate below threshold: {passed}/{total} passed \
         ({pass_rate:.1}%), required {threshold:.1}%\n\n{summary}"
    )]
    ThresholdNotMet {
        passed: usize,
        total: usize,
        /// Percentages, already scaled by 100.
        pass_rate: f64,
        threshold: f64,
        summary: String,
    },

    #[error(
        "[ATH-3001] estimated cost ${estimated_total:.4} exceeds budget ${budget:.2}; \
         raise the budget to at least ${estimated_total:.2} to allow this run"
    )]
    CostLimitExceeded { estimated_total: f64, budget: f64 },

    #[error("[ATH-3002] recorder already finalized; rejected {operation}")]
    RecorderFinalized { operation: &'static str },

    #[error("[ATH-3101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ATH-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl HarnessError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ATH-1001",
            Self::MissingConfig { .. } => "ATH-1002",
            Self::ConfigParse { .. } => "ATH-1003",
            Self::MockExhausted { .. } => "ATH-2001",
            Self::NoMatchingCondition { .. } => "ATH-2002",
            Self::UnmockedTool { .. } => "ATH-2003",
            Self::ToolFailure { .. } => "ATH-2004",
            Self::TimeoutExceeded { .. } => "ATH-2101",
            Self::AssertionFailed { .. } => "ATH-2102",
            Self::ThresholdNotMet { .. } => "ATH-2103",
            Self::CostLimitExceeded { .. } => "ATH-3001",
            Self::RecorderFinalized { .. } => "ATH-3002",
            Self::Serialization { .. } => "ATH-3101",
            Self::Runtime { .. } => "ATH-3900",
        }
    }

    /// Whether this error is a deterministic per-trial verdict rather than a
    /// fault in the harness or its caller.
    ///
    /// The statistical runner catches assertion-class errors and counts them
    /// as failed trials; any other error aborts the whole batch.
    #[must_use]
    pub const fn is_assertion_class(&self) -> bool {
        matches!(
            self,
            Self::MockExhausted { .. }
                | Self::NoMatchingCondition { .. }
                | Self::UnmockedTool { .. }
                | Self::ToolFailure { .. }
                | Self::TimeoutExceeded { .. }
                | Self::AssertionFailed { .. }
                | Self::ThresholdNotMet { .. }
        )
    }

    /// First line of the display form, used as a failure-mode grouping key.
    #[must_use]
    pub fn mode_key(&self) -> String {
        self.to_string()
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for HarnessError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
