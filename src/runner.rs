//! Assertion evaluation and failure dispatch.
//!
//! Every check entry point takes the captured expression as a deferred
//! closure and evaluates it under `catch_unwind`, so a panic while
//! computing an operand is caught at assertion granularity, recorded at
//! the site, and the body continues. Failed evaluations are handed to the
//! active subcase, which keeps the first failure per site verbatim and
//! counts repetitions.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};

use crate::capture::{ApproxPair, Chain};
use crate::compare::{approx_apply, approx_difference, Approximate};
use crate::cx::TestCx;
use crate::each::{run_approx, run_exact, EachPair, Elements};
use crate::error::{panic_message, EngineError};
use crate::report::{FailureKind, PendingFailure, SourceLocation};

/// Immutable metadata for one assertion site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assertion {
    /// Source file of the assertion.
    pub file: &'static str,
    /// Source line of the assertion.
    pub line: u32,
    /// The captured expression text.
    pub expression: &'static str,
}

impl Assertion {
    /// Builds assertion metadata; the capture macros fill this in from
    /// `file!`, `line!`, and `stringify!`.
    #[must_use]
    pub const fn new(file: &'static str, line: u32, expression: &'static str) -> Self {
        Self {
            file,
            line,
            expression,
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            file: self.file.to_string(),
            line: self.line,
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.expression)
    }
}

impl TestCx {
    /// Starts an assertion: skipped entirely when the pass is already
    /// aborted, otherwise counted, returning the site ordinal.
    ///
    /// A site's ordinal is assigned at its first encounter in the pass;
    /// re-executions (a check inside a loop) reuse it, which is what lets
    /// the node collapse repeated failures into one record with a count.
    fn begin_assert(&mut self, info: &Assertion) -> Option<u64> {
        if self.pass_aborted {
            return None;
        }
        self.results.asserts += 1;
        let node = self.active_mut();
        node.assert_count += 1;
        let next = node.assert_count - 1;
        let ordinal = *node
            .seen
            .entry((info.file, info.line, info.expression))
            .or_insert(next);
        Some(ordinal)
    }

    fn record_site_failure(
        &mut self,
        ordinal: u64,
        info: Assertion,
        kind: FailureKind,
        detail: impl FnOnce() -> String,
    ) {
        self.active_mut().record_failure(ordinal, || PendingFailure {
            location: Some(info.location()),
            expression: Some(info.expression),
            kind,
            detail: detail(),
        });
    }

    fn record_site_panic(&mut self, ordinal: u64, info: Assertion, payload: Box<dyn Any + Send>) {
        if payload.is::<EngineError>() {
            resume_unwind(payload);
        }
        self.results.exceptions += 1;
        let message = panic_message(&payload);
        self.record_site_failure(ordinal, info, FailureKind::Panic, || {
            format!("panicked: {message}")
        });
    }

    /// Checks a captured chain; see [`check!`](crate::check!).
    pub fn check<C: Chain>(&mut self, info: Assertion, chain: impl FnOnce() -> C) {
        let Some(ordinal) = self.begin_assert(&info) else {
            return;
        };
        match catch_unwind(AssertUnwindSafe(chain)) {
            Ok(chain) => {
                if !chain.holds() {
                    self.results.failures += 1;
                    self.record_site_failure(ordinal, info, FailureKind::Expansion, || {
                        format!("expands to: {}", chain.expansion())
                    });
                }
            }
            Err(payload) => self.record_site_panic(ordinal, info, payload),
        }
    }

    /// Checks a two-operand comparison approximately; see
    /// [`check_approx!`](crate::check_approx!).
    pub fn check_approx<A, B>(&mut self, info: Assertion, pair: impl FnOnce() -> ApproxPair<A, B>)
    where
        A: Approximate,
        B: Approximate,
    {
        let Some(ordinal) = self.begin_assert(&info) else {
            return;
        };
        match catch_unwind(AssertUnwindSafe(pair)) {
            Ok(pair) => {
                let precision =
                    self.effective_precision(A::DEFAULT_PRECISION.max(B::DEFAULT_PRECISION));
                let (a, b) = pair.operands();
                let holds = approx_apply(pair.op(), a, b, precision)
                    .unwrap_or_else(|err| err.raise());
                if !holds {
                    let difference = approx_difference(a, b);
                    self.results.failures += 1;
                    self.record_site_failure(ordinal, info, FailureKind::Approx, || {
                        format!(
                            "expands to: {}\ndifference: {difference:e} (precision {precision:e})",
                            pair.expansion()
                        )
                    });
                }
            }
            Err(payload) => self.record_site_panic(ordinal, info, payload),
        }
    }

    /// Compares two sequences in lock-step; see
    /// [`check_each!`](crate::check_each!).
    pub fn check_each<A, B>(&mut self, info: Assertion, pair: impl FnOnce() -> EachPair<A, B>)
    where
        A: Elements,
        B: Elements,
        A::Item: fmt::Debug,
        B::Item: fmt::Debug,
    {
        let Some(ordinal) = self.begin_assert(&info) else {
            return;
        };
        match catch_unwind(AssertUnwindSafe(pair)) {
            Ok(pair) => {
                let outcome = run_exact(&pair).unwrap_or_else(|err| err.raise());
                if !outcome.passed() {
                    self.results.failures += 1;
                    self.record_site_failure(ordinal, info, FailureKind::Elementwise, || {
                        outcome.render()
                    });
                }
            }
            Err(payload) => self.record_site_panic(ordinal, info, payload),
        }
    }

    /// Compares two sequences approximately in lock-step; see
    /// [`check_each_approx!`](crate::check_each_approx!).
    pub fn check_each_approx<A, B>(
        &mut self,
        info: Assertion,
        pair: impl FnOnce() -> EachPair<A, B>,
    ) where
        A: Elements,
        B: Elements,
        A::Item: Approximate + fmt::Debug,
        B::Item: Approximate + fmt::Debug,
    {
        let Some(ordinal) = self.begin_assert(&info) else {
            return;
        };
        match catch_unwind(AssertUnwindSafe(pair)) {
            Ok(pair) => {
                let precision = self.effective_precision(
                    <A::Item as Approximate>::DEFAULT_PRECISION
                        .max(<B::Item as Approximate>::DEFAULT_PRECISION),
                );
                let outcome = run_approx(&pair, precision).unwrap_or_else(|err| err.raise());
                if !outcome.passed() {
                    self.results.failures += 1;
                    self.record_site_failure(ordinal, info, FailureKind::Elementwise, || {
                        outcome.render()
                    });
                }
            }
            Err(payload) => self.record_site_panic(ordinal, info, payload),
        }
    }

    /// Asserts that evaluating the expression does not panic; see
    /// [`check_noexcept!`](crate::check_noexcept!).
    pub fn check_noexcept(&mut self, info: Assertion, thunk: impl FnOnce()) {
        let Some(ordinal) = self.begin_assert(&info) else {
            return;
        };
        if let Err(payload) = catch_unwind(AssertUnwindSafe(thunk)) {
            self.record_site_panic(ordinal, info, payload);
        }
    }
}
