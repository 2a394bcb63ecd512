//! Statistical orchestrator: calibration, budget enforcement, and a bounded
//! worker pool over repeated trials.
//!
//! Trial #1 always runs serially as the calibration trial; its cost seeds a
//! pre-flight estimate that can abort the run before any pooled work is
//! scheduled. Trials 2..=N run on scoped worker threads pulling indices off
//! a channel. Cancellation is cooperative: an abort flag and a shared
//! cumulative-cost counter are checked at each pull boundary, and a trial
//! that has started always finishes, its cost folded in.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel as channel;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::core::config::HarnessConfig;
use crate::core::errors::{HarnessError, Result};
use crate::run::context::TrialContext;
use crate::runner::result::StatisticalResult;
use crate::trace::model::Trace;

/// Per-trial accounting kept by the runner.
struct TrialRecord {
    passed: bool,
    mode: Option<String>,
    cost: f64,
    duration_seconds: f64,
    tokens: u64,
    failed_trace: Option<Arc<Trace>>,
}

/// State shared between worker threads, guarded by one mutex.
struct BatchState {
    cumulative_cost: f64,
    records: Vec<TrialRecord>,
    first_error: Option<HarnessError>,
    cancelled: usize,
    budget_exhausted: bool,
}

/// Runs a trial function N times and aggregates a statistical verdict.
#[derive(Debug)]
pub struct StatisticalRunner {
    config: HarnessConfig,
}

impl StatisticalRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Execute `trial` `runner.trial_count` times against fresh contexts.
    ///
    /// Assertion-class trial errors become statistical failures; any other
    /// error cancels unscheduled trials and propagates. A pre-flight budget
    /// overrun returns [`HarnessError::CostLimitExceeded`] and produces no
    /// result.
    pub fn run<F>(&self, input: &str, trial: F) -> Result<StatisticalResult>
    where
        F: Fn(&TrialContext) -> Result<()> + Send + Sync,
    {
        let n = self.config.runner.trial_count;
        let threshold = self.config.runner.threshold;
        let budget = self.config.runner.cost_budget;
        info!(trials = n, threshold, budget, "starting statistical run");

        // Calibration trial: serial, outside the pool. A non-assertion error
        // here aborts the whole run before anything is scheduled.
        let calibration = self.execute_trial(input, &trial)?;
        let estimated_total = calibration.cost * n as f64;
        debug!(
            calibration_cost = calibration.cost,
            estimated_total, "calibration trial complete"
        );
        if estimated_total > budget {
            warn!(estimated_total, budget, "pre-flight budget check failed");
            return Err(HarnessError::CostLimitExceeded {
                estimated_total,
                budget,
            });
        }

        let mut records = vec![calibration];
        let mut cancelled = 0;
        let mut budget_exhausted = false;

        if n > 1 {
            let worker_count = (n - 1).min(self.config.runner.max_workers);
            let (work_tx, work_rx) = channel::unbounded::<usize>();
            for index in 2..=n {
                work_tx.send(index).map_err(|_| HarnessError::Runtime {
                    details: "trial work channel closed before scheduling".to_string(),
                })?;
            }
            drop(work_tx);

            let abort = AtomicBool::new(false);
            let state = Mutex::new(BatchState {
                cumulative_cost: records[0].cost,
                records: Vec::with_capacity(n - 1),
                first_error: None,
                cancelled: 0,
                budget_exhausted: false,
            });

            thread::scope(|scope| {
                for _ in 0..worker_count {
                    let work_rx = work_rx.clone();
                    let state = &state;
                    let abort = &abort;
                    let trial = &trial;
                    scope.spawn(move || {
                        while let Ok(index) = work_rx.recv() {
                            // Pull boundary: do not start new work once the
                            // batch is aborting or the budget is spent.
                            if abort.load(Ordering::Acquire) {
                                state.lock().cancelled += 1;
                                continue;
                            }
                            let over_budget = state.lock().cumulative_cost > budget;
                            if over_budget {
                                let mut guard = state.lock();
                                guard.cancelled += 1;
                                guard.budget_exhausted = true;
                                warn!(index, "budget exhausted; trial cancelled");
                                continue;
                            }

                            debug!(index, "starting pooled trial");
                            match self.execute_trial(input, trial) {
                                Ok(record) => {
                                    let mut guard = state.lock();
                                    guard.cumulative_cost += record.cost;
                                    guard.records.push(record);
                                }
                                Err(error) => {
                                    warn!(
                                        index,
                                        code = error.code(),
                                        "trial raised a non-assertion error; aborting batch"
                                    );
                                    abort.store(true, Ordering::Release);
                                    let mut guard = state.lock();
                                    if guard.first_error.is_none() {
                                        guard.first_error = Some(error);
                                    }
                                }
                            }
                        }
                    });
                }
            });

            let batch = state.into_inner();
            if let Some(error) = batch.first_error {
                return Err(error);
            }
            records.extend(batch.records);
            cancelled = batch.cancelled;
            budget_exhausted = batch.budget_exhausted;
        }

        Ok(aggregate(
            records,
            cancelled,
            budget_exhausted,
            threshold,
        ))
    }

    /// Run one trial against a fresh context and classify its outcome.
    fn execute_trial<F>(&self, input: &str, trial: &F) -> Result<TrialRecord>
    where
        F: Fn(&TrialContext) -> Result<()> + Send + Sync,
    {
        let ctx = TrialContext::new(input, &self.config);
        match trial(&ctx) {
            Ok(()) => {
                let trace = ctx.into_trace()?;
                Ok(TrialRecord {
                    passed: true,
                    mode: None,
                    cost: trace.total_cost,
                    duration_seconds: trace.duration_seconds,
                    tokens: trace.total_tokens,
                    failed_trace: None,
                })
            }
            Err(error) if error.is_assertion_class() => {
                // Timeouts hand their partial trace through the error; for
                // everything else the context still holds the trace.
                let trace = match &error {
                    HarnessError::TimeoutExceeded {
                        partial_trace: Some(partial),
                        ..
                    } => Arc::clone(partial),
                    _ => ctx.into_trace()?,
                };
                Ok(TrialRecord {
                    passed: false,
                    mode: Some(error.mode_key()),
                    cost: trace.total_cost,
                    duration_seconds: trace.duration_seconds,
                    tokens: trace.total_tokens,
                    failed_trace: Some(trace),
                })
            }
            Err(error) => Err(error),
        }
    }
}

fn aggregate(
    records: Vec<TrialRecord>,
    cancelled: usize,
    budget_exhausted: bool,
    threshold: f64,
) -> StatisticalResult {
    let total_trials = records.len();
    let passed = records.iter().filter(|r| r.passed).count();
    let failed = total_trials - passed;

    let mut failure_modes: BTreeMap<String, usize> = BTreeMap::new();
    let mut failed_traces = Vec::new();
    for record in &records {
        if let Some(mode) = &record.mode {
            *failure_modes.entry(mode.clone()).or_insert(0) += 1;
        }
    }
    for record in records.iter().filter(|r| !r.passed) {
        if let Some(trace) = &record.failed_trace {
            failed_traces.push(Arc::clone(trace));
        }
    }

    let total_cost: f64 = records.iter().map(|r| r.cost).sum();
    let (mean_duration_seconds, mean_tokens, pass_rate) = if total_trials == 0 {
        (0.0, 0.0, 0.0)
    } else {
        let denom = total_trials as f64;
        (
            records.iter().map(|r| r.duration_seconds).sum::<f64>() / denom,
            records.iter().map(|r| r.tokens as f64).sum::<f64>() / denom,
            passed as f64 / denom,
        )
    };

    let result = StatisticalResult {
        total_trials,
        passed,
        failed,
        cancelled,
        pass_rate,
        threshold,
        overall_passed: pass_rate >= threshold,
        failure_modes,
        total_cost,
        mean_duration_seconds,
        mean_tokens,
        budget_exhausted,
        failed_traces,
    };
    info!(
        passed,
        failed,
        cancelled,
        pass_rate,
        total_cost,
        overall = result.overall_passed,
        "statistical run complete"
    );
    result
}
