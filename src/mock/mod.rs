//! Mock dispatch layer: response strategies and the per-trial registry.

pub mod registry;
pub mod strategy;
