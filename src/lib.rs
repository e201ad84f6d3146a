//! Casewalk: a subcase-tree test execution engine.
//!
//! Test cases declare nested subcases inline with ordinary control flow;
//! the engine discovers the tree by re-running the body, entering exactly
//! one new leaf per pass. Assertions capture their relational structure
//! (operands and operators, chains included) so failures render expanded
//! values, keep only the first failure per site verbatim, and count
//! repetitions. Panics are caught at assertion, subcase, and case
//! granularity without losing sibling leaves.
//!
//! # Quick start
//!
//! ```
//! use casewalk::{check, subcase, Driver, Registry};
//!
//! let mut registry = Registry::new();
//! registry.case("math", |cx| {
//!     check!(cx, 1 + 1 == 2);
//!     subcase!(cx, "ordering", {
//!         check!(cx, 1 < 2 < 3);
//!     });
//! });
//!
//! let report = Driver::default().run(&registry).expect("engine error");
//! assert!(report.success());
//! assert_eq!(report.results.asserts, 2);
//! ```
//!
//! # Structure
//!
//! - [`compare`]: operators and exact/approximate comparison strategies
//! - [`capture`] and [`printer`]: expression chains and operand rendering
//! - [`runner`] and [`each`]: the check entry points
//! - [`TestCx`] and the subcase engine: traversal by re-execution
//! - [`report`]: failure aggregation and the run summary
//! - [`registry`]: case registration and the driver

#![warn(missing_docs)]

pub mod capture;
pub mod compare;
pub mod config;
mod cx;
pub mod each;
pub mod error;
mod macros;
pub mod printer;
pub mod registry;
pub mod report;
pub mod runner;
mod subcase;

pub use compare::{Approximate, Op};
pub use config::{ConfigError, RunConfig};
pub use cx::TestCx;
pub use each::Elements;
pub use error::{EngineError, EngineErrorKind};
pub use registry::{register, run_tests, CaseDef, Driver, Registry};
pub use report::{ExitCode, FailureKind, FailureRecord, RunReport, SourceLocation, TestResults};
pub use runner::Assertion;
