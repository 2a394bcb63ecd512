//! Single-trial execution: contexts, adapters, and the outcome API.

pub mod adapter;
pub mod context;
pub mod outcome;
