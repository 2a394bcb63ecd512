//! Predicates over the tool-call events of a trace.

use crate::predicate::Verdict;
use crate::trace::event::{EventBody, ToolArgs};
use crate::trace::model::Trace;

/// The tool was invoked at least once.
#[must_use]
pub fn tool_was_called(trace: &Trace, name: &str) -> Verdict {
    match first_call_index(trace, name) {
        Some(index) => Verdict::pass(format!("Tool '{name}' was called."))
            .with_highlight(index, format!("first call to '{name}'")),
        None => Verdict::fail(format!("Tool '{name}' was never called.")),
    }
}

/// The tool was never invoked.
#[must_use]
pub fn tool_not_called(trace: &Trace, name: &str) -> Verdict {
    match first_call_index(trace, name) {
        Some(index) => Verdict::fail(format!("Tool '{name}' was called but expected not to be."))
            .with_highlight(index, format!("unexpected call to '{name}'")),
        None => Verdict::pass(format!("Tool '{name}' was not called.")),
    }
}

/// The tool was invoked exactly `expected` times.
#[must_use]
pub fn tool_call_count(trace: &Trace, name: &str, expected: usize) -> Verdict {
    let count = trace
        .tool_calls()
        .filter(|e| e.body.tool_name() == Some(name))
        .count();
    if count == expected {
        Verdict::pass(format!("Tool '{name}' was called {count} times."))
    } else {
        Verdict::fail(format!(
            "Tool '{name}' was called {count} times, expected {expected}."
        ))
    }
}

/// Some invocation of the tool carried exactly these arguments.
#[must_use]
pub fn tool_called_with(trace: &Trace, name: &str, expected: &ToolArgs) -> Verdict {
    let matched = calls_of(trace, name).find(|(_, args)| *args == expected);
    match matched {
        Some((index, _)) => {
            Verdict::pass(format!("Tool '{name}' was called with exact args: {expected:?}"))
                .with_highlight(index, "matching call".to_string())
        }
        None => Verdict::fail(format!(
            "Tool '{name}' was never called with exact args: {expected:?}"
        )),
    }
}

/// Some invocation of the tool carried a superset of these key/value pairs.
#[must_use]
pub fn tool_called_with_partial(trace: &Trace, name: &str, expected: &ToolArgs) -> Verdict {
    let matched = calls_of(trace, name)
        .find(|(_, args)| expected.iter().all(|(k, v)| args.get(k) == Some(v)));
    match matched {
        Some((index, _)) => Verdict::pass(format!(
            "Tool '{name}' was called with partial args: {expected:?}"
        ))
        .with_highlight(index, "matching call".to_string()),
        None => Verdict::fail(format!(
            "Tool '{name}' was never called with partial args matching: {expected:?}"
        )),
    }
}

/// The first call to `first` precedes the first call to `second`.
///
/// A missing tool on either side is a plain `false` verdict naming it —
/// never treated as ambiguous or as an error.
#[must_use]
pub fn tool_called_before(trace: &Trace, first: &str, second: &str) -> Verdict {
    let first_idx = first_call_index(trace, first);
    let second_idx = first_call_index(trace, second);

    let Some(first_idx) = first_idx else {
        return Verdict::fail(format!("Tool '{first}' was never called."));
    };
    let Some(second_idx) = second_idx else {
        return Verdict::fail(format!("Tool '{second}' was never called."));
    };

    if first_idx < second_idx {
        Verdict::pass(format!(
            "Tool '{first}' (event {first_idx}) was called before '{second}' (event {second_idx})."
        ))
    } else {
        Verdict::fail(format!(
            "Tool '{first}' (event {first_idx}) was NOT called before '{second}' (event {second_idx})."
        ))
    }
    .with_highlight(first_idx, format!("first call to '{first}'"))
    .with_highlight(second_idx, format!("first call to '{second}'"))
}

/// Some call to `first` is directly followed by a call to `second`, counting
/// only tool-call events — model and state events do not break adjacency.
#[must_use]
pub fn tool_called_immediately_before(trace: &Trace, first: &str, second: &str) -> Verdict {
    let tool_events: Vec<(usize, &str)> = trace
        .events
        .iter()
        .filter_map(|e| e.body.tool_name().map(|name| (e.index, name)))
        .collect();

    for pair in tool_events.windows(2) {
        if pair[0].1 == first && pair[1].1 == second {
            return Verdict::pass(format!(
                "Tool '{first}' was called immediately before '{second}'."
            ))
            .with_highlight(pair[0].0, format!("call to '{first}'"))
            .with_highlight(pair[1].0, format!("next tool call, '{second}'"));
        }
    }
    Verdict::fail(format!(
        "Tool '{first}' was NOT called immediately before '{second}'."
    ))
}

/// The given names appear as a subsequence of the observed call order:
/// elements may be separated by unrelated calls but keep their relative
/// order. Greedy two-pointer scan.
#[must_use]
pub fn call_order_contains(trace: &Trace, subsequence: &[&str]) -> Verdict {
    let mut sub_idx = 0;
    for name in trace.call_order() {
        if sub_idx < subsequence.len() && name == subsequence[sub_idx] {
            sub_idx += 1;
        }
    }
    if sub_idx == subsequence.len() {
        Verdict::pass(format!("Trace contains tool call subsequence: {subsequence:?}"))
    } else {
        Verdict::fail(format!(
            "Trace does NOT contain tool call subsequence: {subsequence:?} \
             (matched {sub_idx} of {} elements)",
            subsequence.len()
        ))
    }
}

fn first_call_index(trace: &Trace, name: &str) -> Option<usize> {
    trace
        .events
        .iter()
        .find(|e| e.body.tool_name() == Some(name))
        .map(|e| e.index)
}

fn calls_of<'a>(
    trace: &'a Trace,
    name: &'a str,
) -> impl Iterator<Item = (usize, &'a ToolArgs)> + 'a {
    trace.events.iter().filter_map(move |e| match &e.body {
        EventBody::ToolCall {
            name: call_name,
            args,
            ..
        } if call_name == name => Some((e.index, args)),
        _ => None,
    })
}
