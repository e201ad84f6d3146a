//! Relational operators and comparison strategies.
//!
//! [`Op`] carries the six relational operators as values so captured chains
//! can name the operator in a failure report. Exact comparison never goes
//! through `Op` at evaluation time: the capture site stores a monomorphized
//! `fn(&A, &B) -> bool` over the user's `PartialEq`/`PartialOrd` impls, so
//! heterogeneous operand types work wherever the user's operator is defined.
//!
//! Approximate comparison is a separate strategy defined for `==` and `!=`
//! only, driven by the [`Approximate`] trait and the active precision.

use core::fmt;

use crate::error::EngineError;

/// A relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `>`
    Gt,
}

impl Op {
    /// Returns the source-level symbol for the operator.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Gt => ">",
        }
    }

    /// Returns true for the two equivalence operators (`==`, `!=`), the
    /// only ones with an approximate interpretation.
    #[must_use]
    pub const fn is_equivalence(&self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A value that participates in approximate comparison.
///
/// `magnitude` and `difference` are customization points; the defaults are
/// the absolute value of the `f64` coercion and the arithmetic difference.
pub trait Approximate {
    /// Default tolerance for this type when neither the subcase nor the run
    /// sets one.
    const DEFAULT_PRECISION: f64;

    /// The value coerced to `f64`.
    fn approx_value(&self) -> f64;

    /// Magnitude used to scale the relative comparison.
    fn magnitude(&self) -> f64 {
        self.approx_value().abs()
    }

    /// Signed difference between this value and `other`.
    fn difference(&self, other: f64) -> f64 {
        self.approx_value() - other
    }
}

macro_rules! impl_approximate {
    ($precision:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Approximate for $ty {
                const DEFAULT_PRECISION: f64 = $precision;

                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_lossless,
                    clippy::unnecessary_cast
                )]
                fn approx_value(&self) -> f64 {
                    *self as f64
                }
            }
        )+
    };
}

impl_approximate!(1e-6 => f32);
impl_approximate!(1e-12 => f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Approximate equivalence under precision `p`.
///
/// With `ma = |a|`, `mb = |b|`, and the geometric mean `mg = sqrt(ma * mb)`:
/// when `mg` is zero both magnitudes must already be below `p`, otherwise
/// the scaled difference `|a - b| / mg` must be below `p`.
#[must_use]
pub fn approx_eq<A, B>(a: &A, b: &B, precision: f64) -> bool
where
    A: Approximate + ?Sized,
    B: Approximate + ?Sized,
{
    let ma = a.magnitude();
    let mb = b.magnitude();
    let mg = (ma * mb).sqrt();
    if mg == 0.0 {
        ma < precision && mb < precision
    } else {
        a.difference(b.approx_value()).abs() / mg < precision
    }
}

/// Applies `op` approximately, failing for ordering operators.
pub(crate) fn approx_apply<A, B>(
    op: Op,
    a: &A,
    b: &B,
    precision: f64,
) -> Result<bool, EngineError>
where
    A: Approximate + ?Sized,
    B: Approximate + ?Sized,
{
    match op {
        Op::Eq => Ok(approx_eq(a, b, precision)),
        Op::Ne => Ok(!approx_eq(a, b, precision)),
        Op::Lt | Op::Le | Op::Ge | Op::Gt => Err(EngineError::approx_operator(op)),
    }
}

/// Signed difference between two approximate values.
#[must_use]
pub(crate) fn approx_difference<A, B>(a: &A, b: &B) -> f64
where
    A: Approximate + ?Sized,
    B: Approximate + ?Sized,
{
    a.difference(b.approx_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip_the_source_forms() {
        assert_eq!(Op::Eq.symbol(), "==");
        assert_eq!(Op::Ne.symbol(), "!=");
        assert_eq!(Op::Lt.symbol(), "<");
        assert_eq!(Op::Le.symbol(), "<=");
        assert_eq!(Op::Ge.symbol(), ">=");
        assert_eq!(Op::Gt.symbol(), ">");
    }

    #[test]
    fn only_equivalence_ops_are_approximate() {
        assert!(Op::Eq.is_equivalence());
        assert!(Op::Ne.is_equivalence());
        for op in [Op::Lt, Op::Le, Op::Ge, Op::Gt] {
            assert!(!op.is_equivalence(), "{op}");
        }
    }

    #[test]
    fn near_values_are_approx_equal() {
        assert!(approx_eq(&1.0_f64, &(1.0 + 1e-13), 1e-9));
        assert!(!approx_eq(&1.0_f64, &(1.0 + 1e-13), 1e-15));
    }

    #[test]
    fn zero_magnitude_compares_against_precision_directly() {
        // One operand exactly zero forces the geometric mean to zero.
        assert!(approx_eq(&0.0_f64, &1e-15, 1e-9));
        assert!(!approx_eq(&0.0_f64, &1.0, 1e-9));
        assert!(approx_eq(&0.0_f64, &0.0_f64, 1e-12));
    }

    #[test]
    fn mixed_width_operands() {
        assert!(approx_eq(&1.0_f32, &1.000_000_1_f64, 1e-3));
        assert_eq!(f32::DEFAULT_PRECISION, 1e-6);
        assert_eq!(f64::DEFAULT_PRECISION, 1e-12);
        assert_eq!(u32::DEFAULT_PRECISION, 1e-12);
    }

    #[test]
    fn ordering_ops_are_rejected() {
        let err = approx_apply(Op::Lt, &1.0_f64, &2.0_f64, 1e-9).expect_err("must reject <");
        assert_eq!(
            err.kind(),
            crate::error::EngineErrorKind::ApproxOperator
        );
        assert!(approx_apply(Op::Ne, &1.0_f64, &2.0_f64, 1e-9).expect("!= is defined"));
    }

    #[test]
    fn difference_is_signed() {
        assert!(approx_difference(&1.0_f64, &2.0_f64) < 0.0);
        assert!(approx_difference(&2.0_f64, &1.0_f64) > 0.0);
    }
}
