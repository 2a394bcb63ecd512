//! Execution-adapter contract, plus the built-in callable adapter.
//!
//! An adapter drives the agent-under-test against the trial's isolated mock
//! registry and finalizes the context's trace. It must honor the supplied
//! timeout, returning a partial trace with a timeout-class error if
//! exceeded. Agent-level failures are captured into the trace's terminal
//! error, not re-raised — the trial function decides what they mean.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::errors::{HarnessError, Result};
use crate::mock::registry::MockRegistry;
use crate::run::context::TrialContext;
use crate::run::outcome::RunOutcome;
use crate::trace::model::TraceError;

/// Drives one agent execution against a trial context.
pub trait ExecutionAdapter: Send + Sync {
    /// Execute the agent and finalize the context's trace.
    ///
    /// On success the returned outcome wraps the finalized trace; agent
    /// errors surface through the trace's `error` field. A timeout returns
    /// [`HarnessError::TimeoutExceeded`] carrying the partial trace.
    fn execute(&self, ctx: &TrialContext, timeout: Duration) -> Result<RunOutcome>;
}

/// Agent entry point for the callable adapter: receives the trial's registry
/// and input, returns the final output (if any).
pub type AgentFn = Arc<dyn Fn(Arc<MockRegistry>, String) -> Result<Option<String>> + Send + Sync>;

/// Adapter for plain synchronous agent functions.
///
/// The agent runs on a helper thread so the deadline can be enforced with a
/// channel timeout; a timed-out agent thread is abandoned, and any appends
/// it attempts after finalization fail with the recorder's finalized error.
pub struct CallableAdapter {
    agent: AgentFn,
}

impl CallableAdapter {
    pub fn new<F>(agent: F) -> Self
    where
        F: Fn(Arc<MockRegistry>, String) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            agent: Arc::new(agent),
        }
    }
}

impl ExecutionAdapter for CallableAdapter {
    fn execute(&self, ctx: &TrialContext, timeout: Duration) -> Result<RunOutcome> {
        let (tx, rx) = channel::bounded::<Result<Option<String>>>(1);
        let agent = Arc::clone(&self.agent);
        let registry = ctx.registry_handle();
        let input = ctx.input().to_string();

        thread::Builder::new()
            .name("ath-agent".to_string())
            .spawn(move || {
                let _ = tx.send(agent(registry, input));
            })
            .map_err(|error| HarnessError::Runtime {
                details: format!("failed to spawn agent thread: {error}"),
            })?;

        match rx.recv_timeout(timeout) {
            Ok(Ok(final_output)) => {
                debug!("agent finished cleanly");
                let trace = ctx.finalize(final_output, None)?;
                Ok(ctx.outcome(trace))
            }
            Ok(Err(error)) => {
                // Captured into the trace, not re-raised: the trial's
                // predicates decide whether a failing agent is a failing test.
                debug!(code = error.code(), "agent returned an error");
                let trace = ctx.finalize(None, Some(TraceError::from(&error)))?;
                Ok(ctx.outcome(trace))
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                let seconds = timeout.as_secs_f64();
                warn!(seconds, "agent exceeded its deadline");
                let marker = HarnessError::TimeoutExceeded {
                    seconds,
                    partial_trace: None,
                };
                let trace = ctx.finalize(None, Some(TraceError::from(&marker)))?;
                Err(HarnessError::TimeoutExceeded {
                    seconds,
                    partial_trace: Some(trace),
                })
            }
            Err(channel::RecvTimeoutError::Disconnected) => Err(HarnessError::Runtime {
                details: "agent thread terminated without reporting a result".to_string(),
            }),
        }
    }
}

impl TrialContext {
    /// Run a synchronous agent function under the configured timeout.
    ///
    /// Convenience over [`CallableAdapter`]; consumes the context's single
    /// execution window, so it can be called at most once per trial.
    pub fn run_agent<F>(&self, agent: F) -> Result<RunOutcome>
    where
        F: Fn(Arc<MockRegistry>, String) -> Result<Option<String>> + Send + Sync + 'static,
    {
        let timeout = Duration::from_secs_f64(self.config().mocks.timeout_seconds);
        CallableAdapter::new(agent).execute(self, timeout)
    }
}
