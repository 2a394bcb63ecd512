//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use agent_trial_harness::prelude::*;
//! ```

// Core
pub use crate::core::config::HarnessConfig;
pub use crate::core::errors::{HarnessError, Result};

// Trace
pub use crate::trace::event::{EventBody, ToolArgs, TraceEvent};
pub use crate::trace::format::TraceFormatter;
pub use crate::trace::model::{Trace, TraceError};
pub use crate::trace::recorder::TraceRecorder;

// Mocks
pub use crate::mock::registry::{MockRegistry, MockResponder};
pub use crate::mock::strategy::{ConditionalArm, ResponseStrategy};

// Predicates
pub use crate::predicate::Verdict;

// Single-trial execution
pub use crate::run::adapter::{CallableAdapter, ExecutionAdapter};
pub use crate::run::context::TrialContext;
pub use crate::run::outcome::{RecordedCall, RunOutcome};

// Statistical runner
pub use crate::runner::result::StatisticalResult;
pub use crate::runner::statistical::StatisticalRunner;
