//! Case registration and the run driver.
//!
//! Registration is explicit and order-preserving. Cases land either in a
//! value-type [`Registry`] (embedded runs, tests of the engine itself) or
//! in the process-global registry behind [`register`], which lets modules
//! contribute cases before a single [`run_tests`] call drains them in
//! registration order.
//!
//! The driver owns the pass loop: prime the stack with a root node, run
//! passes until the traversal cursor exhausts the tree, catch panics at
//! the case boundary, and convert typed engine-error payloads into the
//! `Err` arm of the run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::RunConfig;
use crate::cx::TestCx;
use crate::error::EngineError;
use crate::report::RunReport;

/// A shareable test case body.
pub type CaseBody = Arc<dyn Fn(&mut TestCx) + Send + Sync>;

/// A named top-level case.
#[derive(Clone)]
pub struct CaseDef {
    /// Display name of the case, the root of its subcase paths.
    pub name: &'static str,
    /// The body invoked once per pass.
    pub body: CaseBody,
}

impl std::fmt::Debug for CaseDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseDef").field("name", &self.name).finish()
    }
}

/// An ordered collection of cases.
#[derive(Debug, Default)]
pub struct Registry {
    cases: Vec<CaseDef>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a case, preserving registration order.
    pub fn case(
        &mut self,
        name: &'static str,
        body: impl Fn(&mut TestCx) + Send + Sync + 'static,
    ) -> &mut Self {
        self.cases.push(CaseDef {
            name,
            body: Arc::new(body),
        });
        self
    }

    /// The registered cases in registration order.
    #[must_use]
    pub fn cases(&self) -> &[CaseDef] {
        &self.cases
    }

    /// Number of registered cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true when no case is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

static REGISTERED: Mutex<Vec<CaseDef>> = Mutex::new(Vec::new());

/// Appends a case to the process-global registry.
pub fn register(name: &'static str, body: impl Fn(&mut TestCx) + Send + Sync + 'static) {
    REGISTERED.lock().push(CaseDef {
        name,
        body: Arc::new(body),
    });
}

/// Snapshot of the process-global registry in registration order.
#[must_use]
pub fn registered() -> Vec<CaseDef> {
    REGISTERED.lock().clone()
}

/// Drives registered cases through the pass loop.
#[derive(Debug, Default)]
pub struct Driver {
    config: RunConfig,
}

impl Driver {
    /// Creates a driver with the given configuration.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Runs every case in `registry`.
    pub fn run(&self, registry: &Registry) -> Result<RunReport, EngineError> {
        self.run_cases(registry.cases())
    }

    /// Runs every case in the process-global registry.
    pub fn run_registered(&self) -> Result<RunReport, EngineError> {
        self.run_cases(&registered())
    }

    fn run_cases(&self, cases: &[CaseDef]) -> Result<RunReport, EngineError> {
        self.config.validate()?;
        let mut cx = TestCx::new(&self.config);

        for case in cases {
            tracing::debug!(case = case.name, "case start");
            cx.begin_case(case.name);
            let mut pass: u64 = 0;
            while !cx.case_finished() {
                if pass >= self.config.max_passes_per_case {
                    return Err(EngineError::traversal_divergence(case.name, pass));
                }
                tracing::trace!(case = case.name, pass, "pass start");
                cx.begin_pass();

                let body = Arc::clone(&case.body);
                let outcome = {
                    let this = &mut cx;
                    catch_unwind(AssertUnwindSafe(move || (*body)(this)))
                };
                if let Err(payload) = outcome {
                    match payload.downcast::<EngineError>() {
                        Ok(err) => return Err(*err),
                        Err(payload) => cx.record_case_panic(payload),
                    }
                }

                cx.end_pass();
                pass += 1;
            }
            tracing::debug!(case = case.name, passes = pass, "case done");
        }

        Ok(cx.into_report())
    }
}

/// Runs the process-global registry with the default configuration.
pub fn run_tests() -> Result<RunReport, EngineError> {
    Driver::default().run_registered()
}
