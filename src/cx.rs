//! The execution context threaded through test bodies.
//!
//! One [`TestCx`] spans a whole run. It owns the subcase stack for the case
//! currently executing, the accumulated counters, and the failure records.
//! The driver hands the context to each case body by `&mut`, which is the
//! borrow-checked rendering of the original design's process-global state:
//! single-threaded within a run, no locks, no suspension points.

use smallvec::SmallVec;

use crate::config::RunConfig;
use crate::error::{panic_message, EngineError};
use crate::report::{FailureKind, FailureRecord, PendingFailure, RunReport, TestResults};
use crate::subcase::SubcaseNode;

/// Execution context for a run, threaded through every test body.
pub struct TestCx {
    pub(crate) stack: SmallVec<[SubcaseNode; 8]>,
    pub(crate) depth: usize,
    pub(crate) pass_aborted: bool,
    pub(crate) results: TestResults,
    pub(crate) records: Vec<FailureRecord>,
    pub(crate) default_precision: Option<f64>,
}

impl TestCx {
    pub(crate) fn new(config: &RunConfig) -> Self {
        Self {
            stack: SmallVec::new(),
            depth: 0,
            pass_aborted: false,
            results: TestResults::default(),
            records: Vec::new(),
            default_precision: config.default_precision,
        }
    }

    // ------------------------------------------------------------------
    // Case and pass lifecycle (driver-facing)
    // ------------------------------------------------------------------

    pub(crate) fn begin_case(&mut self, name: &str) {
        if !self.stack.is_empty() {
            EngineError::stack_invariant(format!(
                "starting case {name:?} with {} nodes still stacked",
                self.stack.len()
            ))
            .raise();
        }
        self.stack.push(SubcaseNode::root(name));
        self.results.cases += 1;
        self.results.subcases += 1;
        self.depth = 0;
    }

    pub(crate) fn case_finished(&self) -> bool {
        self.stack.is_empty()
    }

    pub(crate) fn begin_pass(&mut self) {
        self.depth = 0;
        self.pass_aborted = false;
        let root = &mut self.stack[0];
        root.child_count = 0;
        root.assert_count = 0;
        root.seen.clear();
        root.section.clear();
        root.precision = None;
    }

    pub(crate) fn end_pass(&mut self) {
        self.flush_from(0);
        self.advance_cursor();
    }

    /// Collects recorded failures and exceptions from stack levels
    /// `from..`, in path order, and resets their per-pass failure state.
    pub(crate) fn flush_from(&mut self, from: usize) {
        for d in from..self.stack.len() {
            let path = self.path_string(d);
            let node = &mut self.stack[d];
            for (_, data) in std::mem::take(&mut node.fails) {
                self.records.push(FailureRecord::from_site(path.clone(), data));
            }
            if let Some(data) = node.exception.take() {
                self.records.push(FailureRecord::from_site(path.clone(), data));
            }
        }
    }

    /// Advances the traversal cursor bottom-up after a pass: exhausted
    /// subtrees pop until an unexhausted level remains, and the emptied
    /// stack means the case is done.
    pub(crate) fn advance_cursor(&mut self) {
        while let Some(back) = self.stack.last_mut() {
            back.child_index += 1;
            if back.child_index < back.child_count {
                return;
            }
            self.stack.pop();
        }
    }

    pub(crate) fn record_case_panic(&mut self, payload: Box<dyn std::any::Any + Send>) {
        let message = panic_message(&payload);
        self.results.exceptions += 1;
        if self.stack.is_empty() {
            EngineError::stack_invariant("case panic recorded with no root node").raise();
        }
        self.stack[0].record_exception(|| PendingFailure {
            location: None,
            expression: None,
            kind: FailureKind::Panic,
            detail: format!("panicked: {message}"),
        });
    }

    pub(crate) fn into_report(self) -> RunReport {
        RunReport {
            results: self.results,
            failures: self.records,
        }
    }

    // ------------------------------------------------------------------
    // Node access
    // ------------------------------------------------------------------

    pub(crate) fn active(&self) -> &SubcaseNode {
        if self.depth >= self.stack.len() {
            EngineError::stack_invariant(format!(
                "active depth {} beyond stack of {}",
                self.depth,
                self.stack.len()
            ))
            .raise();
        }
        &self.stack[self.depth]
    }

    pub(crate) fn active_mut(&mut self) -> &mut SubcaseNode {
        if self.depth >= self.stack.len() {
            EngineError::stack_invariant(format!(
                "active depth {} beyond stack of {}",
                self.depth,
                self.stack.len()
            ))
            .raise();
        }
        &mut self.stack[self.depth]
    }

    /// Display path of stack levels `0..=depth`, `:section` suffixes
    /// included.
    pub(crate) fn path_string(&self, depth: usize) -> String {
        let mut out = String::new();
        for node in &self.stack[..=depth] {
            if !out.is_empty() {
                out.push_str(" > ");
            }
            out.push_str(&node.display_name());
        }
        out
    }

    // ------------------------------------------------------------------
    // Runtime-adjustable parameters (author-facing)
    // ------------------------------------------------------------------

    /// The active precision override, if any.
    ///
    /// `None` means approximate comparisons fall back to the per-type
    /// default (`1e-6` for `f32`, `1e-12` for `f64`).
    #[must_use]
    pub fn precision(&self) -> Option<f64> {
        self.active().precision.or(self.default_precision)
    }

    /// Overrides the precision for the active subcase.
    ///
    /// Subcases entered afterwards inherit the override; the parent's value
    /// is restored when the subcase exits.
    pub fn set_precision(&mut self, precision: f64) {
        self.active_mut().precision = Some(precision);
    }

    /// The active subcase's section label.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.active().section
    }

    /// Sets the active subcase's section label, shown as a `:section`
    /// suffix on its display path.
    pub fn set_section(&mut self, section: impl Into<String>) {
        self.active_mut().section = section.into();
    }

    pub(crate) fn effective_precision(&self, type_default: f64) -> f64 {
        self.precision().unwrap_or(type_default)
    }
}
