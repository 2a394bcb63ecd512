//! Event model: one atomic occurrence during a trial.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool-call arguments keyed by parameter name.
///
/// `BTreeMap` keeps display and equality deterministic regardless of the
/// order the adapter assembled the arguments in.
pub type ToolArgs = BTreeMap<String, Value>;

/// Payload of a single trace event.
///
/// A closed sum type: adding a new event kind is a compile-time
/// exhaustiveness failure everywhere events are matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventBody {
    /// The agent invoked a (mocked) tool.
    ToolCall {
        name: String,
        args: ToolArgs,
        result: Option<Value>,
        error: Option<String>,
    },
    /// The agent made a model call; carries token and cost accounting.
    ModelCall {
        model: String,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost: f64,
    },
    /// The agent mutated a named piece of its own state.
    StateChange {
        key: String,
        old_value: Option<Value>,
        new_value: Option<Value>,
    },
}

impl EventBody {
    /// Tool name if this is a tool-call event.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolCall { name, .. } => Some(name),
            Self::ModelCall { .. } | Self::StateChange { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall { .. })
    }

    #[must_use]
    pub const fn is_model_call(&self) -> bool {
        matches!(self, Self::ModelCall { .. })
    }
}

/// A committed event: body plus the commit-time ordering fields.
///
/// Invariant: within one trace, `index` values are contiguous from 0 and
/// `timestamp` values are non-decreasing in index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub body: EventBody,
}
