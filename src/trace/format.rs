//! Human-readable trace rendering with truncation and elision.
//!
//! The formatter consumes predicate output only for annotation (the
//! highlight map); it never participates in predicate logic.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::config::FormatConfig;
use crate::trace::event::EventBody;
use crate::trace::model::Trace;

/// Highlight annotations keyed by event index.
pub type Highlights = BTreeMap<usize, String>;

/// How many leading/trailing events survive elision on long traces.
const EDGE_EVENTS: usize = 3;
/// Context kept around each highlighted event.
const HIGHLIGHT_MARGIN: usize = 2;

/// Renders a [`Trace`] as numbered, typed lines.
#[derive(Debug, Clone)]
pub struct TraceFormatter {
    value_limit: usize,
    max_events: usize,
}

impl Default for TraceFormatter {
    fn default() -> Self {
        Self::new(&FormatConfig::default())
    }
}

impl TraceFormatter {
    #[must_use]
    pub fn new(config: &FormatConfig) -> Self {
        Self {
            value_limit: config.value_limit,
            max_events: config.max_events,
        }
    }

    /// Render the whole trace, eliding the middle of long ones.
    #[must_use]
    pub fn format(&self, trace: &Trace) -> String {
        self.format_with_highlights(trace, &Highlights::new())
    }

    /// Render the trace, marking highlighted events with a pointer
    /// annotation. Highlighted regions are never elided.
    #[must_use]
    pub fn format_with_highlights(&self, trace: &Trace, highlights: &Highlights) -> String {
        let total = trace.events.len();
        if total == 0 {
            return "Actual trace: (empty)".to_string();
        }

        let mut out = vec![format!("Actual trace ({total} events):")];
        let visible = self.visible_indices(total, highlights);

        let mut last_shown: Option<usize> = None;
        for idx in visible {
            if let Some(prev) = last_shown {
                let gap = idx - prev - 1;
                if gap > 0 {
                    out.push(format!("    ... ({gap} events omitted) ..."));
                }
            }
            let event = &trace.events[idx];
            let mut line = self.format_event(idx + 1, &event.body);
            if let Some(note) = highlights.get(&idx) {
                line.push_str(&format!("  <-- {note}"));
            }
            out.push(format!("    {line}"));
            last_shown = Some(idx);
        }

        out.join("\n")
    }

    fn visible_indices(&self, total: usize, highlights: &Highlights) -> BTreeSet<usize> {
        if total <= self.max_events {
            return (0..total).collect();
        }

        let mut visible: BTreeSet<usize> = (0..EDGE_EVENTS.min(total)).collect();
        visible.extend(total.saturating_sub(EDGE_EVENTS)..total);
        for &idx in highlights.keys() {
            let lo = idx.saturating_sub(HIGHLIGHT_MARGIN);
            let hi = (idx + HIGHLIGHT_MARGIN).min(total - 1);
            visible.extend(lo..=hi);
        }
        visible
    }

    fn format_event(&self, display_index: usize, body: &EventBody) -> String {
        match body {
            EventBody::ToolCall {
                name,
                args,
                result,
                error,
            } => {
                let args_str = self.truncate(&format_args_map(args));
                match error {
                    Some(err) => {
                        let err_str = self.truncate(err);
                        format!("{display_index}. [tool]  {name}({args_str}) !! {err_str}")
                    }
                    None => {
                        let result_str = self.truncate(
                            &result.as_ref().map_or_else(|| "null".to_string(), render_value),
                        );
                        format!("{display_index}. [tool]  {name}({args_str}) -> {result_str}")
                    }
                }
            }
            EventBody::ModelCall {
                model,
                prompt_tokens,
                completion_tokens,
                cost,
            } => {
                let tokens = prompt_tokens + completion_tokens;
                format!("{display_index}. [model] {model} ({tokens} tokens, ${cost:.4})")
            }
            EventBody::StateChange {
                key,
                old_value,
                new_value,
            } => {
                let old = self.truncate(
                    &old_value.as_ref().map_or_else(|| "null".to_string(), render_value),
                );
                let new = self.truncate(
                    &new_value.as_ref().map_or_else(|| "null".to_string(), render_value),
                );
                format!("{display_index}. [state] {key}: {old} -> {new}")
            }
        }
    }

    fn truncate(&self, value: &str) -> String {
        if value.chars().count() <= self.value_limit {
            return value.to_string();
        }
        let head: String = value.chars().take(self.value_limit).collect();
        format!("{head}...")
    }
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_args_map(args: &crate::trace::event::ToolArgs) -> String {
    args.iter()
        .map(|(k, v)| format!("{k}={}", render_value(v)))
        .collect::<Vec<_>>()
        .join(", ")
}
