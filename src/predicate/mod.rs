//! Pure predicates over a finalized trace.
//!
//! Every check is a total function `(Trace, args) -> Verdict`: absence of a
//! tool, an empty trace, or a missing output is a normal `false` verdict
//! with an explanatory message, never an error. Nothing here mutates or
//! performs I/O.

pub mod limits;
pub mod output;
pub mod tool_calls;

use crate::trace::format::Highlights;

/// Outcome of one predicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the predicate held.
    pub passed: bool,
    /// Human-readable explanation, phrased for the failing direction too.
    pub message: String,
    /// Event indices implicated by this verdict, for trace annotation.
    pub highlights: Highlights,
}

impl Verdict {
    #[must_use]
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            highlights: Highlights::new(),
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            highlights: Highlights::new(),
        }
    }

    /// Attach an implicated event index.
    #[must_use]
    pub fn with_highlight(mut self, index: usize, note: impl Into<String>) -> Self {
        self.highlights.insert(index, note.into());
        self
    }
}
