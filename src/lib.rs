#![forbid(unsafe_code)]

//! Agent trial harness — statistical testing for non-deterministic agents.
//!
//! Agents that call language models do not behave the same way twice, so a
//! single passing test proves very little. This crate runs a test many times
//! against mocked tools, records every tool and model interaction into an
//! immutable trace, and aggregates the outcomes into a pass rate checked
//! against a threshold, under a hard cost budget.
//!
//! The moving parts:
//! 1. **Trace recorder** — thread-safe event log, finalized into an immutable
//!    [`trace::model::Trace`]
//! 2. **Mock registry** — named responders with static, sequenced,
//!    conditional, error, and delegate strategies
//! 3. **Predicates** — pure checks over a finalized trace, rendered with
//!    event highlights on failure
//! 4. **Statistical runner** — calibration trial, budget pre-flight, and a
//!    bounded worker pool over the remaining trials
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use agent_trial_harness::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use agent_trial_harness::core::config::HarnessConfig;
//! use agent_trial_harness::runner::statistical::StatisticalRunner;
//! ```

pub mod prelude;

pub mod core;
pub mod mock;
pub mod predicate;
pub mod run;
pub mod runner;
pub mod trace;
