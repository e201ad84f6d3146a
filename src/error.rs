//! Engine error types.
//!
//! Errors on this axis are *programmer* errors in the engine or in how it is
//! driven, never user test failures:
//!
//! - Test failures are recorded in the report and execution continues.
//! - Panics raised by user code are caught and recorded per subcase.
//! - `EngineError` means the engine itself was driven into an invalid state
//!   and the run cannot be trusted; it surfaces as the `Err` arm of
//!   [`run_tests`](crate::run_tests).
//!
//! Several invalid states are only detectable deep inside a user body where
//! no `Result` channel exists, so engine errors travel as typed panic
//! payloads via [`EngineError::raise`]. Every unwind boundary in the engine
//! checks for the typed payload and re-raises it instead of recording it as
//! a user exception.

use core::fmt;
use std::any::Any;

use crate::compare::Op;

/// The kind of engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorKind {
    /// The subcase stack was observed in an impossible shape.
    StackInvariant,
    /// Approximate comparison requested for an ordering operator.
    ApproxOperator,
    /// Elementwise comparison over two scalar operands.
    ElementwiseScalars,
    /// A case exceeded the configured pass budget, which means its body
    /// declares a different subcase shape on different passes.
    TraversalDivergence,
    /// The run configuration failed validation.
    Config,
    /// Internal engine bug.
    Internal,
}

impl EngineErrorKind {
    /// Returns a short machine-readable name for the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StackInvariant => "stack-invariant",
            Self::ApproxOperator => "approx-operator",
            Self::ElementwiseScalars => "elementwise-scalars",
            Self::TraversalDivergence => "traversal-divergence",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

/// An engine-internal programmer error.
#[derive(Debug, Clone)]
pub struct EngineError {
    kind: EngineErrorKind,
    detail: String,
}

impl EngineError {
    /// Creates an error with the given kind and detail message.
    #[must_use]
    pub fn new(kind: EngineErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> EngineErrorKind {
        self.kind
    }

    /// Returns the detail message.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Creates a stack invariant violation.
    #[must_use]
    pub fn stack_invariant(detail: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::StackInvariant, detail)
    }

    /// Creates an invalid-operator error for approximate comparison.
    #[must_use]
    pub fn approx_operator(op: Op) -> Self {
        Self::new(
            EngineErrorKind::ApproxOperator,
            format!("approximate comparison is defined for == and != only, got {op}"),
        )
    }

    /// Creates a two-scalars error for elementwise comparison.
    #[must_use]
    pub fn elementwise_scalars() -> Self {
        Self::new(
            EngineErrorKind::ElementwiseScalars,
            "elementwise comparison needs at least one iterable operand",
        )
    }

    /// Creates a traversal divergence error.
    #[must_use]
    pub fn traversal_divergence(case: &str, passes: u64) -> Self {
        Self::new(
            EngineErrorKind::TraversalDivergence,
            format!(
                "case {case:?} still traversing after {passes} passes; \
                 subcase shape must be stable across passes"
            ),
        )
    }

    /// Creates an internal engine bug report.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Internal, detail)
    }

    /// Raises this error as a typed panic payload.
    ///
    /// The driver downcasts the payload back into the `Err` arm of the run;
    /// intermediate unwind boundaries re-raise it untouched.
    pub fn raise(self) -> ! {
        std::panic::panic_any(self)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine error [{}]: {}", self.kind.as_str(), self.detail)
    }
}

impl std::error::Error for EngineError {}

/// Extracts a human-readable message from a caught panic payload.
///
/// Ordinary panics carry `&str` or `String`; anything else is opaque to the
/// engine and reported as such.
#[must_use]
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_detail() {
        let err = EngineError::stack_invariant("depth 3 beyond stack of 2");
        assert_eq!(err.kind(), EngineErrorKind::StackInvariant);
        let msg = err.to_string();
        assert!(msg.contains("stack-invariant"), "{msg}");
        assert!(msg.contains("depth 3"), "{msg}");
    }

    #[test]
    fn approx_operator_names_the_op() {
        let err = EngineError::approx_operator(Op::Lt);
        assert_eq!(err.kind(), EngineErrorKind::ApproxOperator);
        assert!(err.to_string().contains('<'));
    }

    #[test]
    fn raise_is_downcastable() {
        let caught = std::panic::catch_unwind(|| {
            EngineError::elementwise_scalars().raise();
        })
        .expect_err("raise must unwind");
        let err = caught
            .downcast::<EngineError>()
            .expect("payload must be an EngineError");
        assert_eq!(err.kind(), EngineErrorKind::ElementwiseScalars);
    }

    #[test]
    fn panic_message_extraction() {
        let str_payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(str_payload.as_ref()), "boom");

        let string_payload: Box<dyn Any + Send> = Box::new("owned".to_string());
        assert_eq!(panic_message(string_payload.as_ref()), "owned");

        let opaque: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(opaque.as_ref()), "unknown panic payload");
    }

    #[test]
    fn kind_names_are_distinct() {
        use std::collections::HashSet;
        let kinds = [
            EngineErrorKind::StackInvariant,
            EngineErrorKind::ApproxOperator,
            EngineErrorKind::ElementwiseScalars,
            EngineErrorKind::TraversalDivergence,
            EngineErrorKind::Config,
            EngineErrorKind::Internal,
        ];
        let names: HashSet<_> = kinds.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), kinds.len());
    }
}
