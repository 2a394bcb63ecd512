//! Named mock responders and the per-trial registry that dispatches them.
//!
//! Every successful or failed invocation is recorded as exactly one
//! tool-call event *before* control returns to the caller — record before
//! propagate. A registry (and its backing recorder) belongs to exactly one
//! trial; trials never observe each other's call counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::core::errors::{HarnessError, Result};
use crate::mock::strategy::ResponseStrategy;
use crate::trace::event::ToolArgs;
use crate::trace::recorder::TraceRecorder;

struct ResponderState {
    strategy: ResponseStrategy,
    cursor: usize,
    calls_made: usize,
}

/// A named mock: one response strategy plus a call counter.
pub struct MockResponder {
    name: String,
    state: Mutex<ResponderState>,
}

impl MockResponder {
    fn new(name: String, strategy: ResponseStrategy) -> Self {
        Self {
            name,
            state: Mutex::new(ResponderState {
                strategy,
                cursor: 0,
                calls_made: 0,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total invocations so far, successful or not.
    #[must_use]
    pub fn calls_made(&self) -> usize {
        self.state.lock().calls_made
    }

    /// Resolve one invocation and commit its tool-call event.
    fn invoke(&self, recorder: &TraceRecorder, args: &ToolArgs) -> Result<Value> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls_made += 1;
            let ResponderState {
                strategy, cursor, ..
            } = &mut *state;
            strategy.respond(&self.name, args, cursor)
        };

        match &outcome {
            Ok(value) => {
                recorder.record_tool_call(&self.name, args.clone(), Some(value.clone()), None)?;
            }
            Err(error) => {
                recorder.record_tool_call(
                    &self.name,
                    args.clone(),
                    None,
                    Some(error.to_string()),
                )?;
            }
        }
        outcome
    }
}

/// Per-trial registry of named responders.
pub struct MockRegistry {
    strict: bool,
    recorder: Arc<TraceRecorder>,
    responders: Mutex<BTreeMap<String, Arc<MockResponder>>>,
}

impl MockRegistry {
    #[must_use]
    pub fn new(recorder: Arc<TraceRecorder>, strict: bool) -> Self {
        Self {
            strict,
            recorder,
            responders: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register (or replace) a responder for `name`.
    pub fn register(&self, name: &str, strategy: ResponseStrategy) -> Arc<MockResponder> {
        let responder = Arc::new(MockResponder::new(name.to_string(), strategy));
        self.responders
            .lock()
            .insert(name.to_string(), Arc::clone(&responder));
        responder
    }

    /// Look up a registered responder.
    #[must_use]
    pub fn responder(&self, name: &str) -> Option<Arc<MockResponder>> {
        self.responders.lock().get(name).cloned()
    }

    /// Registered tool names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.responders.lock().keys().cloned().collect()
    }

    /// Invoke the responder registered under `name`.
    ///
    /// Strict mode turns an unregistered name into [`HarnessError::UnmockedTool`].
    /// In lenient mode the stray call is still recorded (with an error note)
    /// and answers `null`, so agents that probe optional tools can continue.
    pub fn invoke(&self, name: &str, args: ToolArgs) -> Result<Value> {
        let responder = self.responder(name);
        match responder {
            Some(responder) => {
                debug!(tool = name, "dispatching mock invocation");
                responder.invoke(&self.recorder, &args)
            }
            None if self.strict => {
                debug!(tool = name, "unmocked tool reference (strict)");
                Err(HarnessError::UnmockedTool {
                    tool: name.to_string(),
                    registered: self.names(),
                })
            }
            None => {
                debug!(tool = name, "unmocked tool reference (lenient)");
                self.recorder.record_tool_call(
                    name,
                    args,
                    Some(Value::Null),
                    Some("no responder registered".to_string()),
                )?;
                Ok(Value::Null)
            }
        }
    }

    /// Record a model call into the trial's trace and cost accounting.
    pub fn record_model_call(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost: f64,
    ) -> Result<()> {
        self.recorder
            .record_model_call(model, prompt_tokens, completion_tokens, cost)
    }

    /// Record an agent state transition into the trial's trace.
    pub fn record_state_change(
        &self,
        key: &str,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Result<()> {
        self.recorder.record_state_change(key, old_value, new_value)
    }
}
