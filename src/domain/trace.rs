//! Dynamic Execution Tracer
//!
//! Rebuilds a variable's movement from a live run. The host runtime owns
//! the instrumentation (debugger hooks, step callbacks, a recorded event
//! log) and drives a [`TraceHook`] with one [`FrameSnapshot`] per call and
//! per executed line; [`FlowTracer`] folds those events into ordered
//! [`TraceStep`]s.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::FlowError;

/// Snapshot of the active stack frame at one instrumentation event.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Name of the function executing in the active frame.
    pub function: String,
    /// 1-based source line of the event.
    pub line: usize,
    /// The frame's local bindings at this event.
    pub locals: HashMap<String, Value>,
}

/// Callback contract the instrumented runtime drives.
///
/// Every call and line event is a synchronous suspension point: the hook
/// runs to completion before the traced program resumes.
pub trait TraceHook {
    /// A new activation entered `frame.function`.
    fn on_call(&mut self, frame: &FrameSnapshot);
    /// A statement on `frame.line` is about to execute.
    fn on_line(&mut self, frame: &FrameSnapshot);
}

/// One function activation segment: the contiguous lines visited and the
/// last value observed for the traced variable, or `None` if never bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub function: String,
    /// Distinct lines in first-visit order. A group closes whenever the
    /// active function changes; reentry opens a fresh group.
    pub lines: Vec<usize>,
    pub value: Option<Value>,
}

/// Owned tracer state for a single variable in a single run.
///
/// Events from functions outside the declared set are ignored, which
/// keeps library and runtime internals out of the flow.
pub struct FlowTracer {
    variable: String,
    declared: HashSet<String>,
    /// When set, accounting starts only once the variable first appears
    /// bound in some frame's locals.
    gated: bool,
    started: bool,
    last_func: Option<String>,
    current_lines: Vec<usize>,
    current_value: Option<Value>,
    steps: Vec<TraceStep>,
}

impl FlowTracer {
    pub fn new(variable: impl Into<String>, declared: HashSet<String>) -> Self {
        Self {
            variable: variable.into(),
            declared,
            gated: false,
            started: false,
            last_func: None,
            current_lines: Vec::new(),
            current_value: None,
            steps: Vec::new(),
        }
    }

    /// Variant that suppresses all activations before the traced variable
    /// first becomes bound. Useful when the variable is introduced deep in
    /// a call chain.
    pub fn gated(variable: impl Into<String>, declared: HashSet<String>) -> Self {
        let mut tracer = Self::new(variable, declared);
        tracer.gated = true;
        tracer
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    fn observe(&mut self, frame: &FrameSnapshot) {
        if !self.declared.contains(&frame.function) {
            return;
        }
        if self.gated && !self.started {
            if !frame.locals.contains_key(&self.variable) {
                return;
            }
            self.started = true;
        }
        if self.last_func.as_deref() != Some(frame.function.as_str()) {
            self.flush_group();
            self.last_func = Some(frame.function.clone());
        }
        if !self.current_lines.contains(&frame.line) {
            self.current_lines.push(frame.line);
        }
        if let Some(value) = frame.locals.get(&self.variable) {
            self.current_value = Some(value.clone());
        }
    }

    /// Close the in-progress group, appending it if any line was visited.
    /// The value snapshot never leaks across function changes.
    fn flush_group(&mut self) {
        let function = self.last_func.take();
        let lines = std::mem::take(&mut self.current_lines);
        let value = self.current_value.take();
        if let Some(function) = function {
            if !lines.is_empty() {
                self.steps.push(TraceStep {
                    function,
                    lines,
                    value,
                });
            }
        }
    }

    /// Detach the tracer, flushing the final group.
    pub fn finish(mut self) -> Vec<TraceStep> {
        self.flush_group();
        self.steps
    }
}

impl TraceHook for FlowTracer {
    fn on_call(&mut self, frame: &FrameSnapshot) {
        self.observe(frame);
    }

    fn on_line(&mut self, frame: &FrameSnapshot) {
        self.observe(frame);
    }
}

/// Result of driving an instrumented program: the flow collected so far,
/// plus the error the program raised, if any.
#[derive(Debug)]
pub struct TraceOutcome {
    pub steps: Vec<TraceStep>,
    pub error: Option<FlowError>,
}

impl TraceOutcome {
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Drive an instrumented program to completion under a tracer.
///
/// The program receives the hook and pumps events through it. If it
/// raises, the tracer is still detached and the partial flow is returned
/// together with a [`FlowError::TracedExecution`].
pub fn run_traced<P>(program: P, tracer: FlowTracer) -> TraceOutcome
where
    P: FnOnce(&mut dyn TraceHook) -> anyhow::Result<()>,
{
    let mut tracer = tracer;
    let error = program(&mut tracer)
        .err()
        .map(|e| FlowError::TracedExecution(e.to_string()));
    TraceOutcome {
        steps: tracer.finish(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(function: &str, line: usize, value: Option<i64>) -> FrameSnapshot {
        let mut locals = HashMap::new();
        if let Some(v) = value {
            locals.insert("value".to_string(), json!(v));
        }
        FrameSnapshot {
            function: function.to_string(),
            line,
            locals,
        }
    }

    fn declared(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn groups_close_on_function_change() {
        let mut tracer = FlowTracer::new("value", declared(&["init", "bump"]));
        tracer.on_call(&frame("init", 2, None));
        tracer.on_line(&frame("init", 3, Some(10)));
        tracer.on_call(&frame("bump", 7, Some(10)));
        tracer.on_line(&frame("bump", 8, Some(11)));

        let steps = tracer.finish();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].function, "init");
        assert_eq!(steps[0].lines, vec![2, 3]);
        assert_eq!(steps[0].value, Some(json!(10)));
        assert_eq!(steps[1].function, "bump");
        assert_eq!(steps[1].value, Some(json!(11)));
    }

    #[test]
    fn lines_deduplicate_within_a_group() {
        let mut tracer = FlowTracer::new("value", declared(&["looped"]));
        for _ in 0..3 {
            tracer.on_line(&frame("looped", 4, None));
            tracer.on_line(&frame("looped", 5, None));
        }
        let steps = tracer.finish();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].lines, vec![4, 5]);
    }

    #[test]
    fn undeclared_functions_are_ignored() {
        let mut tracer = FlowTracer::new("value", declared(&["init"]));
        tracer.on_call(&frame("init", 2, Some(1)));
        tracer.on_call(&frame("alloc::vec::push", 900, None));
        tracer.on_line(&frame("init", 3, Some(2)));

        let steps = tracer.finish();
        assert_eq!(steps.len(), 1, "library internals must not split groups");
        assert_eq!(steps[0].lines, vec![2, 3]);
        assert_eq!(steps[0].value, Some(json!(2)));
    }

    #[test]
    fn reentry_opens_a_fresh_group() {
        let mut tracer = FlowTracer::new("value", declared(&["work", "main"]));
        tracer.on_call(&frame("work", 5, Some(1)));
        tracer.on_line(&frame("main", 20, None));
        tracer.on_call(&frame("work", 5, Some(2)));

        let steps = tracer.finish();
        let functions: Vec<&str> = steps.iter().map(|s| s.function.as_str()).collect();
        assert_eq!(functions, vec!["work", "main", "work"]);
    }

    #[test]
    fn gated_tracer_skips_until_first_binding() {
        let mut tracer = FlowTracer::gated("value", declared(&["boot", "init"]));
        tracer.on_call(&frame("boot", 1, None));
        tracer.on_line(&frame("boot", 2, None));
        tracer.on_call(&frame("init", 10, Some(10)));

        let steps = tracer.finish();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].function, "init");
    }

    #[test]
    fn run_traced_preserves_partial_flow_on_error() {
        let declared = declared(&["init"]);
        let outcome = run_traced(
            |hook| {
                hook.on_call(&frame("init", 2, Some(10)));
                anyhow::bail!("division by zero")
            },
            FlowTracer::new("value", declared),
        );
        assert_eq!(outcome.steps.len(), 1);
        let err = outcome.error.expect("error must surface");
        assert!(err.to_string().contains("division by zero"));
    }
}
