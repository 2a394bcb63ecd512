//! Statistical orchestration: repeated trials, budget enforcement, and
//! aggregated verdicts.

pub mod result;
pub mod statistical;
