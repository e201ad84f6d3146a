//! Failure aggregation and the run summary.
//!
//! Per-site state lives in [`AssertData`]: the first failure is captured
//! verbatim, later failures at the same site only bump a counter, so a
//! check inside a loop reports its expansion once with a repetition count.
//! At the end of each pass the driver collects the per-node data into
//! [`FailureRecord`]s and the machine-readable [`TestResults`] counters.

use core::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// What kind of failure a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// An assertion chain evaluated false; the detail holds the expansion.
    Expansion,
    /// An approximate comparison failed; the detail holds the expansion
    /// and the numeric difference.
    Approx,
    /// An elementwise comparison failed; the detail holds the per-index
    /// mismatches and the size mismatch line when applicable.
    Elementwise,
    /// A panic was caught (at assertion, subcase, or case granularity).
    Panic,
}

/// Source position of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file path as reported by the capture macro.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A failure captured before the subcase path is known.
#[derive(Debug, Clone)]
pub(crate) struct PendingFailure {
    pub location: Option<SourceLocation>,
    pub expression: Option<&'static str>,
    pub kind: FailureKind,
    pub detail: String,
}

/// Per-assertion-site state inside one subcase: the first failure
/// verbatim, plus how often the site failed.
#[derive(Debug, Clone)]
pub(crate) struct AssertData {
    pub first_fail: PendingFailure,
    pub fail_count: u64,
}

impl AssertData {
    pub(crate) fn first(first_fail: PendingFailure) -> Self {
        Self {
            first_fail,
            fail_count: 1,
        }
    }
}

/// One entry in the rendered failure report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Subcase path from the case root, `:section` suffixes included.
    pub path: String,
    /// Source location, absent for panics outside assertions.
    pub location: Option<SourceLocation>,
    /// Captured expression text, absent for panics outside assertions.
    pub expression: Option<String>,
    /// Failure classification.
    pub kind: FailureKind,
    /// Rendered failure body.
    pub detail: String,
    /// How many times the site failed within the pass.
    pub count: u64,
}

impl FailureRecord {
    pub(crate) fn from_site(path: String, data: AssertData) -> Self {
        let PendingFailure {
            location,
            expression,
            kind,
            detail,
        } = data.first_fail;
        Self {
            path,
            location,
            expression: expression.map(str::to_string),
            kind,
            detail,
            count: data.fail_count,
        }
    }
}

/// Machine-readable run totals, accumulated across all passes of all
/// cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    /// Top-level cases executed.
    pub cases: u64,
    /// Distinct subcases entered (case roots included).
    pub subcases: u64,
    /// Assertions evaluated.
    pub asserts: u64,
    /// Failed assertion evaluations (every repetition counts).
    pub failures: u64,
    /// Panics caught at any granularity.
    pub exceptions: u64,
}

impl TestResults {
    /// Returns true when no failure and no exception was recorded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures == 0 && self.exceptions == 0
    }
}

/// Semantic exit codes for embedding the runner in a binary.
pub struct ExitCode;

impl ExitCode {
    /// Every assertion held and nothing panicked.
    pub const SUCCESS: i32 = 0;
    /// One or more failures or exceptions were recorded.
    pub const TEST_FAILURE: i32 = 10;
}

/// The complete output of a run: totals plus the failure records in the
/// order the bodies produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Accumulated counters.
    pub results: TestResults,
    /// Failure records in first-seen order.
    pub failures: Vec<FailureRecord>,
}

impl RunReport {
    /// Returns true when the run is clean.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.results.is_clean()
    }

    /// Maps the run outcome onto a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::TEST_FAILURE
        }
    }

    /// Renders the human-readable report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== casewalk report ({} failure records) ===",
            self.failures.len()
        );

        for record in &self.failures {
            let _ = writeln!(out);
            let _ = writeln!(out, "FAILED: {}", record.path);
            if let Some(location) = &record.location {
                let _ = writeln!(out, "  {location}");
            }
            if let Some(expression) = &record.expression {
                let _ = writeln!(out, "  {expression}");
            }
            for line in record.detail.lines() {
                let _ = writeln!(out, "    {line}");
            }
            if record.count > 1 {
                let _ = writeln!(out, "    failed {} times", record.count);
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "=== summary ===");
        let r = &self.results;
        let _ = writeln!(
            out,
            "cases: {} | subcases: {} | asserts: {} | failures: {} | exceptions: {}",
            r.cases, r.subcases, r.asserts, r.failures, r.exceptions
        );
        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
