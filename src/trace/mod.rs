//! Trace model: events, the per-trial recorder, and rendering.

pub mod event;
pub mod format;
pub mod model;
pub mod recorder;
