//! Per-trial execution context: one recorder, one mock registry, zero
//! cross-trial sharing.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::config::HarnessConfig;
use crate::core::errors::Result;
use crate::mock::registry::MockRegistry;
use crate::run::outcome::RunOutcome;
use crate::trace::model::{Trace, TraceError};
use crate::trace::recorder::TraceRecorder;

/// Everything one trial executes against.
///
/// Constructed fresh for every trial by the statistical runner (or directly
/// by a caller running a single trial). The registry and recorder are never
/// reused, so mock cursors and call counters always start from zero.
pub struct TrialContext {
    input: String,
    config: HarnessConfig,
    recorder: Arc<TraceRecorder>,
    registry: Arc<MockRegistry>,
    finalized: Mutex<Option<Arc<Trace>>>,
}

impl TrialContext {
    #[must_use]
    pub fn new(input: impl Into<String>, config: &HarnessConfig) -> Self {
        let input = input.into();
        let recorder = Arc::new(TraceRecorder::open(input.clone()));
        let registry = Arc::new(MockRegistry::new(
            Arc::clone(&recorder),
            config.mocks.strict,
        ));
        Self {
            input,
            config: config.clone(),
            recorder,
            registry,
            finalized: Mutex::new(None),
        }
    }

    /// The input handed to the agent under test.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The trial's isolated mock registry.
    #[must_use]
    pub fn mocks(&self) -> &MockRegistry {
        &self.registry
    }

    /// Shared handle to the registry, for adapters that spawn threads.
    #[must_use]
    pub fn registry_handle(&self) -> Arc<MockRegistry> {
        Arc::clone(&self.registry)
    }

    /// Shared handle to the recorder, for adapters that record directly.
    #[must_use]
    pub fn recorder_handle(&self) -> Arc<TraceRecorder> {
        Arc::clone(&self.recorder)
    }

    /// Finalize the trial's recorder into an immutable trace.
    ///
    /// Called by the execution adapter when the agent finishes (or times
    /// out). A second call is a programming error, mirroring the recorder.
    pub fn finalize(
        &self,
        final_output: Option<String>,
        error: Option<TraceError>,
    ) -> Result<Arc<Trace>> {
        let trace = Arc::new(self.recorder.finalize(final_output, error)?);
        *self.finalized.lock() = Some(Arc::clone(&trace));
        Ok(trace)
    }

    /// The finalized trace, if the trial has finished.
    #[must_use]
    pub fn trace(&self) -> Option<Arc<Trace>> {
        self.finalized.lock().clone()
    }

    /// The finalized trace, finalizing an idle recorder on the fly.
    ///
    /// Used by the runner to collect cost/duration accounting even from
    /// trials that never drove an agent.
    pub fn into_trace(self) -> Result<Arc<Trace>> {
        if let Some(trace) = self.finalized.lock().clone() {
            return Ok(trace);
        }
        let trace = Arc::new(self.recorder.finalize(None, None)?);
        Ok(trace)
    }

    /// Wrap a finalized trace in the query/assert API.
    #[must_use]
    pub fn outcome(&self, trace: Arc<Trace>) -> RunOutcome {
        RunOutcome::new(trace, &self.config.format)
    }
}
