//! Subcase tree discovery and traversal by re-execution.
//!
//! The tree is never registered up front: the body declares subcases with
//! ordinary control flow, and the engine re-runs the body once per leaf.
//! Every stack level carries a `(child_count, child_index)` cursor pair;
//! a declaration is entered exactly when the parent's cursor points at it,
//! and cursors advance bottom-up between passes. The mechanism requires a
//! body whose subcase shape is stable across passes for any fixed ancestor
//! path; a shape-shifting body has undefined traversal, bounded by the
//! driver's pass budget.
//!
//! A subcase body runs under `catch_unwind`. Depth is restored on every
//! exit path; a panic is recorded into the node's exception slot and the
//! remainder of the pass is demoted to bookkeeping-only mode, so sibling
//! declarations are still discovered and get their own passes.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};

use crate::cx::TestCx;
use crate::error::{panic_message, EngineError};
use crate::report::{AssertData, FailureKind, PendingFailure};

/// Identity of an assertion site within a pass: file, line, and captured
/// expression text (the latter disambiguates two sites on one line).
pub(crate) type SiteKey = (&'static str, u32, &'static str);

/// One level of the active subcase path.
#[derive(Debug)]
pub(crate) struct SubcaseNode {
    pub(crate) name: String,
    pub(crate) section: String,
    pub(crate) child_count: u64,
    pub(crate) child_index: u64,
    pub(crate) assert_count: u64,
    pub(crate) precision: Option<f64>,
    /// Site ordinals assigned at first encounter this pass; a loop that
    /// re-executes a site reuses its ordinal, which is what makes
    /// de-duplication work.
    pub(crate) seen: BTreeMap<SiteKey, u64>,
    pub(crate) fails: BTreeMap<u64, AssertData>,
    pub(crate) exception: Option<AssertData>,
    /// Whether this node (under its current name) was already counted in
    /// the subcase total.
    pub(crate) counted: bool,
}

impl SubcaseNode {
    pub(crate) fn fresh(precision: Option<f64>) -> Self {
        Self {
            name: String::new(),
            section: String::new(),
            child_count: 0,
            child_index: 0,
            assert_count: 0,
            precision,
            seen: BTreeMap::new(),
            fails: BTreeMap::new(),
            exception: None,
            counted: false,
        }
    }

    pub(crate) fn root(name: &str) -> Self {
        let mut node = Self::fresh(None);
        node.name = name.to_string();
        node.counted = true;
        node
    }

    pub(crate) fn display_name(&self) -> String {
        if self.section.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, self.section)
        }
    }

    /// Records a failure at `ordinal`. The first failure renders through
    /// `make`; repeats only bump the counter, so rendering cost is paid
    /// once per site per pass.
    pub(crate) fn record_failure(&mut self, ordinal: u64, make: impl FnOnce() -> PendingFailure) {
        if ordinal >= self.assert_count {
            EngineError::stack_invariant(format!(
                "failure at ordinal {ordinal} but assert count is {}",
                self.assert_count
            ))
            .raise();
        }
        match self.fails.entry(ordinal) {
            std::collections::btree_map::Entry::Occupied(mut entry) => {
                entry.get_mut().fail_count += 1;
            }
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(AssertData::first(make()));
            }
        }
    }

    /// Records into the dedicated exception slot; only the first panic at
    /// this node per pass is captured verbatim.
    pub(crate) fn record_exception(&mut self, make: impl FnOnce() -> PendingFailure) {
        match &mut self.exception {
            Some(data) => data.fail_count += 1,
            None => self.exception = Some(AssertData::first(make())),
        }
    }
}

impl TestCx {
    /// Declares a subcase named `name`.
    ///
    /// Whether `body` runs on this pass is decided by the parent's cursor;
    /// either way the parent observes one more child. Use the
    /// [`subcase!`](crate::subcase!) macro rather than calling this
    /// directly.
    pub fn subcase(&mut self, name: &str, body: impl FnOnce(&mut TestCx)) {
        if self.pass_aborted {
            self.active_mut().child_count += 1;
            return;
        }
        if self.depth + 1 > self.stack.len() {
            EngineError::stack_invariant(format!(
                "depth {} beyond stack of {} at subcase {name:?}",
                self.depth,
                self.stack.len()
            ))
            .raise();
        }
        if self.depth + 1 == self.stack.len() {
            let inherited = self.stack[self.depth].precision;
            self.stack.push(SubcaseNode::fresh(inherited));
        }

        let parent = &self.stack[self.depth];
        let enter = parent.child_index == parent.child_count;
        let inherited = parent.precision;

        if enter {
            self.depth += 1;
            let fresh = {
                let depth = self.depth;
                let node = &mut self.stack[depth];
                let fresh = !node.counted || node.name != name;
                if node.name != name {
                    node.name = name.to_string();
                }
                node.counted = true;
                node.section.clear();
                node.child_count = 0;
                node.assert_count = 0;
                node.seen.clear();
                node.precision = inherited;
                fresh
            };
            if fresh {
                self.results.subcases += 1;
            }

            let outcome = {
                let this = &mut *self;
                catch_unwind(AssertUnwindSafe(move || body(this)))
            };

            self.depth -= 1;
            if let Err(payload) = outcome {
                if payload.is::<EngineError>() {
                    resume_unwind(payload);
                }
                let message = panic_message(&payload);
                self.results.exceptions += 1;
                let entered = self.depth + 1;
                self.stack[entered].record_exception(|| PendingFailure {
                    location: None,
                    expression: None,
                    kind: FailureKind::Panic,
                    detail: format!("panicked: {message}"),
                });
                self.pass_aborted = true;
            }
        }

        self.stack[self.depth].child_count += 1;
    }

    /// Runs `body` `count` times as sub-iterations of a synthetic subcase.
    ///
    /// Each iteration resets the per-subcase counters and labels itself
    /// with the iteration index as its section, and flushes its failures
    /// at the iteration boundary, so per-iteration failures stay distinct
    /// in the report. Use the [`repeat!`](crate::repeat!) macro rather
    /// than calling this directly.
    pub fn repeat(&mut self, count: u64, mut body: impl FnMut(&mut TestCx)) {
        self.subcase("repeat", move |cx| {
            for i in 0..count {
                {
                    let node = cx.active_mut();
                    node.section = i.to_string();
                    node.child_count = 0;
                    node.assert_count = 0;
                    node.seen.clear();
                }
                body(cx);
                let depth = cx.depth;
                cx.flush_from(depth);
                if cx.pass_aborted {
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(detail: &str) -> PendingFailure {
        PendingFailure {
            location: None,
            expression: None,
            kind: FailureKind::Expansion,
            detail: detail.to_string(),
        }
    }

    #[test]
    fn display_name_appends_section() {
        let mut node = SubcaseNode::root("case");
        assert_eq!(node.display_name(), "case");
        node.section = "3".to_string();
        assert_eq!(node.display_name(), "case:3");
    }

    #[test]
    fn first_failure_is_kept_verbatim_and_repeats_count() {
        let mut node = SubcaseNode::root("case");
        node.assert_count = 1;
        node.record_failure(0, || pending("first"));
        node.record_failure(0, || pending("second"));
        node.record_failure(0, || pending("third"));

        let data = node.fails.get(&0).expect("entry for ordinal 0");
        assert_eq!(data.first_fail.detail, "first");
        assert_eq!(data.fail_count, 3);
    }

    #[test]
    fn failure_beyond_assert_count_is_a_stack_invariant_breach() {
        let mut node = SubcaseNode::root("case");
        node.assert_count = 1;
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            node.record_failure(5, || pending("late"));
        }))
        .expect_err("must raise");
        assert!(caught.is::<EngineError>());
    }

    #[test]
    fn exception_slot_keeps_first_and_counts() {
        let mut node = SubcaseNode::root("case");
        node.record_exception(|| pending("boom"));
        node.record_exception(|| pending("again"));
        let data = node.exception.as_ref().expect("slot filled");
        assert_eq!(data.first_fail.detail, "boom");
        assert_eq!(data.fail_count, 2);
    }
}
