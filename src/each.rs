//! Elementwise operand classification and lock-step iteration.
//!
//! Both sides of an elementwise check are classified through [`Elements`]
//! as iterable or scalar. A scalar facing an iterable is replayed for every
//! element, so the iteration length is the iterable's length and no size
//! mismatch can occur. Two iterables step in lock-step; differing lengths
//! are a size mismatch, a distinct failure from element mismatches. Two
//! scalars are a programmer error.

use core::fmt;

use crate::compare::{approx_apply, Approximate, Op};
use crate::error::EngineError;
use crate::printer::Operand;

/// Classification of one operand for elementwise iteration.
pub enum ElementsRef<'a, T> {
    /// A sequence of borrowed elements with a known length.
    Iterable {
        /// Borrowing iterator over the elements.
        iter: Box<dyn Iterator<Item = &'a T> + 'a>,
        /// Number of elements the iterator will yield.
        len: usize,
    },
    /// A single value replayed against every element of the other side.
    Scalar(&'a T),
}

/// An operand usable in elementwise checks.
///
/// Implemented for the common sequence shapes and for scalar primitives;
/// user types opt in by classifying themselves.
pub trait Elements {
    /// The element type compared pairwise.
    type Item;

    /// Classifies the operand as iterable or scalar.
    fn elements(&self) -> ElementsRef<'_, Self::Item>;
}

impl<T> Elements for Vec<T> {
    type Item = T;

    fn elements(&self) -> ElementsRef<'_, T> {
        ElementsRef::Iterable {
            iter: Box::new(self.iter()),
            len: self.len(),
        }
    }
}

impl<T, const N: usize> Elements for [T; N] {
    type Item = T;

    fn elements(&self) -> ElementsRef<'_, T> {
        ElementsRef::Iterable {
            iter: Box::new(self.iter()),
            len: N,
        }
    }
}

impl<'s, T> Elements for &'s [T] {
    type Item = T;

    fn elements(&self) -> ElementsRef<'_, T> {
        ElementsRef::Iterable {
            iter: Box::new(self.iter()),
            len: self.len(),
        }
    }
}

macro_rules! impl_scalar_elements {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Elements for $ty {
                type Item = $ty;

                fn elements(&self) -> ElementsRef<'_, $ty> {
                    ElementsRef::Scalar(self)
                }
            }
        )+
    };
}

impl_scalar_elements!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl<'a> Elements for &'a str {
    type Item = &'a str;

    fn elements(&self) -> ElementsRef<'_, &'a str> {
        ElementsRef::Scalar(self)
    }
}

/// A captured two-operand elementwise comparison.
///
/// For exact checks the element comparator is captured as a monomorphized
/// `fn` pointer at the macro site; approximate checks carry none and
/// compare through [`Approximate`] at evaluation time.
pub struct EachPair<A: Elements, B: Elements> {
    lhs: Operand<A>,
    op: Op,
    cmp: Option<fn(&A::Item, &B::Item) -> bool>,
    rhs: Operand<B>,
}

/// Captures an exact elementwise comparison.
#[must_use]
pub fn each_pair<A: Elements, B: Elements>(
    lhs: Operand<A>,
    op: Op,
    cmp: fn(&A::Item, &B::Item) -> bool,
    rhs: Operand<B>,
) -> EachPair<A, B> {
    EachPair {
        lhs,
        op,
        cmp: Some(cmp),
        rhs,
    }
}

/// Captures an approximate elementwise comparison.
#[must_use]
pub fn each_pair_approx<A: Elements, B: Elements>(
    lhs: Operand<A>,
    op: Op,
    rhs: Operand<B>,
) -> EachPair<A, B> {
    EachPair {
        lhs,
        op,
        cmp: None,
        rhs,
    }
}

impl<A: Elements, B: Elements> EachPair<A, B> {
    /// The captured operator.
    #[must_use]
    pub fn op(&self) -> Op {
        self.op
    }

    /// Renders the expanded `lhs op rhs` form (whole operands, not
    /// elements).
    #[must_use]
    pub fn expansion(&self) -> String {
        format!("{} {} {}", self.lhs.render(), self.op.symbol(), self.rhs.render())
    }
}

/// Outcome of one elementwise evaluation.
#[derive(Debug)]
pub(crate) struct EachOutcome {
    /// One `at index i: ...` line per failing element pair.
    pub mismatches: Vec<String>,
    /// Lengths of both sides when both are iterable and disagree.
    pub size_mismatch: Option<(usize, usize)>,
}

impl EachOutcome {
    pub(crate) fn passed(&self) -> bool {
        self.mismatches.is_empty() && self.size_mismatch.is_none()
    }

    /// Renders the failure body: mismatch lines first, then the size line.
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.mismatches {
            out.push_str(line);
            out.push('\n');
        }
        if let Some((left, right)) = self.size_mismatch {
            out.push_str(&format!(
                "size mismatch: left has {left} elements, right has {right}"
            ));
            out.push('\n');
        }
        out
    }
}

fn mismatch_line<X: fmt::Debug, Y: fmt::Debug>(index: usize, a: &X, op: Op, b: &Y) -> String {
    format!("at index {index}: {a:?} {} {b:?}", op.symbol())
}

/// Runs the lock-step iteration with a per-pair predicate.
fn run_with<A, B>(
    pair: &EachPair<A, B>,
    mut holds: impl FnMut(&A::Item, &B::Item) -> Result<bool, EngineError>,
) -> Result<EachOutcome, EngineError>
where
    A: Elements,
    B: Elements,
    A::Item: fmt::Debug,
    B::Item: fmt::Debug,
{
    let op = pair.op;
    let mut mismatches = Vec::new();
    let mut size_mismatch = None;

    match (pair.lhs.value().elements(), pair.rhs.value().elements()) {
        (ElementsRef::Scalar(_), ElementsRef::Scalar(_)) => {
            return Err(EngineError::elementwise_scalars());
        }
        (ElementsRef::Scalar(a), ElementsRef::Iterable { iter, .. }) => {
            for (i, b) in iter.enumerate() {
                if !holds(a, b)? {
                    mismatches.push(mismatch_line(i, a, op, b));
                }
            }
        }
        (ElementsRef::Iterable { iter, .. }, ElementsRef::Scalar(b)) => {
            for (i, a) in iter.enumerate() {
                if !holds(a, b)? {
                    mismatches.push(mismatch_line(i, a, op, b));
                }
            }
        }
        (
            ElementsRef::Iterable {
                iter: mut left,
                len: left_len,
            },
            ElementsRef::Iterable {
                iter: mut right,
                len: right_len,
            },
        ) => {
            let mut i = 0;
            while let (Some(a), Some(b)) = (left.next(), right.next()) {
                if !holds(a, b)? {
                    mismatches.push(mismatch_line(i, a, op, b));
                }
                i += 1;
            }
            if left_len != right_len {
                size_mismatch = Some((left_len, right_len));
            }
        }
    }

    Ok(EachOutcome {
        mismatches,
        size_mismatch,
    })
}

/// Evaluates an exact elementwise comparison.
pub(crate) fn run_exact<A, B>(pair: &EachPair<A, B>) -> Result<EachOutcome, EngineError>
where
    A: Elements,
    B: Elements,
    A::Item: fmt::Debug,
    B::Item: fmt::Debug,
{
    let Some(cmp) = pair.cmp else {
        return Err(EngineError::internal(
            "exact elementwise evaluation without a captured comparator",
        ));
    };
    run_with(pair, |a, b| Ok(cmp(a, b)))
}

/// Evaluates an approximate elementwise comparison under `precision`.
pub(crate) fn run_approx<A, B>(
    pair: &EachPair<A, B>,
    precision: f64,
) -> Result<EachOutcome, EngineError>
where
    A: Elements,
    B: Elements,
    A::Item: Approximate + fmt::Debug,
    B::Item: Approximate + fmt::Debug,
{
    let op = pair.op;
    run_with(pair, |a, b| approx_apply(op, a, b, precision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;

    fn operand<T: fmt::Debug>(value: T) -> Operand<T> {
        Operand::with(value, |v| format!("{v:?}"))
    }

    #[test]
    fn equal_sequences_pass() {
        let pair = each_pair(operand(vec![1, 2, 3]), Op::Eq, |a, b| a == b, operand(vec![1, 2, 3]));
        let outcome = run_exact(&pair).expect("valid operands");
        assert!(outcome.passed());
    }

    #[test]
    fn element_mismatch_is_reported_by_index() {
        let pair = each_pair(operand(vec![1, 2, 3]), Op::Eq, |a, b| a == b, operand(vec![1, 2, 4]));
        let outcome = run_exact(&pair).expect("valid operands");
        assert_eq!(outcome.mismatches, vec!["at index 2: 3 == 4".to_string()]);
        assert!(outcome.size_mismatch.is_none());
    }

    #[test]
    fn size_mismatch_without_element_mismatch() {
        let pair = each_pair(operand(vec![1, 2]), Op::Eq, |a, b| a == b, operand(vec![1, 2, 3]));
        let outcome = run_exact(&pair).expect("valid operands");
        assert!(outcome.mismatches.is_empty());
        assert_eq!(outcome.size_mismatch, Some((2, 3)));
        assert!(outcome.render().contains("size mismatch"));
    }

    #[test]
    fn scalar_replays_against_every_element() {
        let pair = each_pair(operand(vec![1, 5, 1]), Op::Eq, |a, b| a == b, operand(1));
        let outcome = run_exact(&pair).expect("valid operands");
        assert_eq!(outcome.mismatches.len(), 1);
        assert!(outcome.mismatches[0].starts_with("at index 1:"));
        // Scalar against iterable never produces a size mismatch.
        assert!(outcome.size_mismatch.is_none());
    }

    #[test]
    fn two_scalars_are_a_programmer_error() {
        let pair = each_pair(operand(1), Op::Eq, |a, b| a == b, operand(2));
        let err = run_exact(&pair).expect_err("two scalars must be rejected");
        assert_eq!(err.kind(), EngineErrorKind::ElementwiseScalars);
    }

    #[test]
    fn ordering_ops_apply_elementwise() {
        let pair = each_pair(operand(vec![1, 2, 9]), Op::Lt, |a, b| a < b, operand(vec![2, 3, 4]));
        let outcome = run_exact(&pair).expect("valid operands");
        assert_eq!(outcome.mismatches, vec!["at index 2: 9 < 4".to_string()]);
    }

    #[test]
    fn approx_elementwise_uses_precision() {
        let lhs = vec![1.0_f64, 2.0];
        let rhs = vec![1.0 + 1e-13, 2.0];
        let pair = each_pair_approx(operand(lhs.clone()), Op::Eq, operand(rhs.clone()));
        assert!(run_approx(&pair, 1e-9).expect("valid").passed());

        let pair = each_pair_approx(operand(lhs), Op::Eq, operand(rhs));
        let outcome = run_approx(&pair, 1e-15).expect("valid");
        assert_eq!(outcome.mismatches.len(), 1);
    }

    #[test]
    fn approx_elementwise_rejects_ordering_ops() {
        let pair = each_pair_approx(operand(vec![1.0_f64]), Op::Lt, operand(vec![2.0_f64]));
        let err = run_approx(&pair, 1e-9).expect_err("ordering op must be rejected");
        assert_eq!(err.kind(), EngineErrorKind::ApproxOperator);
    }

    #[test]
    fn arrays_and_slices_classify_as_iterable() {
        let arr = [1, 2, 3];
        assert!(matches!(arr.elements(), ElementsRef::Iterable { len: 3, .. }));
        let slice: &[i32] = &arr;
        assert!(matches!(slice.elements(), ElementsRef::Iterable { len: 3, .. }));
        assert!(matches!(7_i32.elements(), ElementsRef::Scalar(_)));
    }
}
