//! Response strategies: how a named mock answers each invocation.
//!
//! A closed sum type matched exhaustively in one place — adding a sixth
//! strategy is a compile-time exhaustiveness failure, not a runtime lookup
//! miss.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::errors::{HarnessError, Result};
use crate::trace::event::ToolArgs;

/// User-supplied responder function for [`ResponseStrategy::Delegate`].
pub type DelegateFn = Arc<dyn Fn(&ToolArgs) -> Result<Value> + Send + Sync>;

/// Argument predicate for one [`ConditionalArm`].
pub type ConditionFn = Arc<dyn Fn(&ToolArgs) -> bool + Send + Sync>;

/// One (predicate, value) pair of a conditional strategy.
#[derive(Clone)]
pub struct ConditionalArm {
    when: ConditionFn,
    value: Value,
}

impl ConditionalArm {
    pub fn new<F>(when: F, value: Value) -> Self
    where
        F: Fn(&ToolArgs) -> bool + Send + Sync + 'static,
    {
        Self {
            when: Arc::new(when),
            value,
        }
    }
}

/// The five ways a mock can answer.
#[derive(Clone)]
pub enum ResponseStrategy {
    /// Every invocation returns the same stored value.
    Static(Value),
    /// Returns values in order; exhaustion is terminal.
    Sequence(Vec<Value>),
    /// First matching arm wins; falls back to `default` if no arm matches.
    Conditional {
        arms: Vec<ConditionalArm>,
        default: Option<Value>,
    },
    /// Fails every invocation with the configured message.
    Error(String),
    /// Defers to a user-supplied function.
    Delegate(DelegateFn),
}

impl ResponseStrategy {
    /// Build a delegate strategy from a closure.
    pub fn delegate<F>(f: F) -> Self
    where
        F: Fn(&ToolArgs) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Delegate(Arc::new(f))
    }

    /// Produce the response for one invocation.
    ///
    /// `cursor` is the sequence position owned by the responder; it advances
    /// only on a successful sequence invocation and never resets, so an
    /// exhausted sequence stays exhausted.
    pub(crate) fn respond(&self, tool: &str, args: &ToolArgs, cursor: &mut usize) -> Result<Value> {
        match self {
            Self::Static(value) => Ok(value.clone()),
            Self::Sequence(values) => {
                if *cursor >= values.len() {
                    return Err(HarnessError::MockExhausted {
                        tool: tool.to_string(),
                        calls_made: values.len(),
                    });
                }
                let value = values[*cursor].clone();
                *cursor += 1;
                Ok(value)
            }
            Self::Conditional { arms, default } => {
                for arm in arms {
                    if (arm.when)(args) {
                        return Ok(arm.value.clone());
                    }
                }
                default.clone().ok_or_else(|| HarnessError::NoMatchingCondition {
                    tool: tool.to_string(),
                    args: format!("{args:?}"),
                })
            }
            Self::Error(message) => Err(HarnessError::ToolFailure {
                tool: tool.to_string(),
                message: message.clone(),
            }),
            Self::Delegate(f) => f(args),
        }
    }
}

impl fmt::Debug for ResponseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Sequence(values) => f.debug_tuple("Sequence").field(&values.len()).finish(),
            Self::Conditional { arms, default } => f
                .debug_struct("Conditional")
                .field("arms", &arms.len())
                .field("default", default)
                .finish(),
            Self::Error(message) => f.debug_tuple("Error").field(message).finish(),
            Self::Delegate(_) => f.write_str("Delegate(..)"),
        }
    }
}
