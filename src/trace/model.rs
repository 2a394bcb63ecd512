//! Immutable trace: the finalized record of everything one trial did.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::{HarnessError, Result};
use crate::trace::event::TraceEvent;

/// Serializable form of a trial's terminal error.
///
/// Carries the stable error code and the display message rather than the
/// error value itself, so traces stay cloneable and exportable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceError {
    pub code: String,
    pub message: String,
}

impl From<&HarnessError> for TraceError {
    fn from(value: &HarnessError) -> Self {
        Self {
            code: value.code().to_string(),
            message: value.to_string(),
        }
    }
}

/// Ordered, immutable record of one trial's execution.
///
/// Produced by finalizing a [`TraceRecorder`](crate::trace::recorder::TraceRecorder)
/// exactly once; thereafter read-only and safe to share across threads
/// behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub run_id: Uuid,
    pub input: String,
    pub events: Vec<TraceEvent>,
    pub final_output: Option<String>,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub duration_seconds: f64,
    pub llm_calls: usize,
    pub error: Option<TraceError>,
}

impl Trace {
    /// Iterate over tool-call events only, in commit order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter().filter(|e| e.body.is_tool_call())
    }

    /// Tool names in commit order.
    #[must_use]
    pub fn call_order(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| e.body.tool_name())
            .collect()
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Export as pretty-printed JSON for external reporters.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a trace previously produced by [`Self::to_json`].
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
