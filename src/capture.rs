//! Left-associative capture of relational expressions.
//!
//! A captured expression is a chain: a head operand plus zero or more
//! `(operator, operand)` continuations. The `check!` macro munches the
//! expression tokens left to right, seeding the chain with the leftmost
//! operand and extending it once per relational operator, so
//! `a op0 b op1 c` captures as head `a` with continuations `(op0, b)` and
//! `(op1, c)`. Every operand is stored by move together with its
//! pre-selected renderer; nothing is copied or rendered on the success
//! path.
//!
//! Each builder method captures a monomorphized `fn(&Last, &B) -> bool`
//! where the user's `PartialEq`/`PartialOrd` bound holds, so chain
//! evaluation itself needs no comparison bounds and operand types may
//! differ freely.
//!
//! Chains read like their mathematical form: `a < b < c` holds iff
//! `a < b` and `b < c`.

use crate::compare::Op;
use crate::printer::Operand;

/// A single-element chain: just the head operand.
pub struct Head<T> {
    operand: Operand<T>,
}

/// Seeds a chain with its leftmost operand.
#[must_use]
pub fn seed<T>(operand: Operand<T>) -> Head<T> {
    Head { operand }
}

/// A chain extended by one `(operator, operand)` continuation.
pub struct Link<P: Operands, B> {
    prev: P,
    op: Op,
    cmp: fn(&P::Last, &B) -> bool,
    operand: Operand<B>,
}

/// Evaluation surface shared by every chain shape.
pub trait Operands {
    /// The rightmost operand type.
    type Last;

    /// Returns the rightmost operand.
    fn last(&self) -> &Self::Last;

    /// Returns true iff every captured pairwise comparison holds.
    fn links_hold(&self) -> bool;

    /// Appends the expanded `v0 op0 v1 ...` form.
    fn write_expansion(&self, out: &mut String);

    /// Number of operands in the chain.
    fn arity(&self) -> usize;
}

impl<T> Operands for Head<T> {
    type Last = T;

    fn last(&self) -> &T {
        self.operand.value()
    }

    fn links_hold(&self) -> bool {
        true
    }

    fn write_expansion(&self, out: &mut String) {
        out.push_str(&self.operand.render());
    }

    fn arity(&self) -> usize {
        1
    }
}

impl<P: Operands, B> Operands for Link<P, B> {
    type Last = B;

    fn last(&self) -> &B {
        self.operand.value()
    }

    fn links_hold(&self) -> bool {
        self.prev.links_hold() && (self.cmp)(self.prev.last(), self.operand.value())
    }

    fn write_expansion(&self, out: &mut String) {
        self.prev.write_expansion(out);
        out.push(' ');
        out.push_str(self.op.symbol());
        out.push(' ');
        out.push_str(&self.operand.render());
    }

    fn arity(&self) -> usize {
        self.prev.arity() + 1
    }
}

/// Truthiness of a bare (single-operand) chain.
pub trait Truthy {
    /// Returns the truth value of the captured expression.
    fn truthy(&self) -> bool;
}

impl Truthy for bool {
    fn truthy(&self) -> bool {
        *self
    }
}

impl<T> Truthy for Option<T> {
    fn truthy(&self) -> bool {
        self.is_some()
    }
}

impl<T, E> Truthy for Result<T, E> {
    fn truthy(&self) -> bool {
        self.is_ok()
    }
}

/// A fully-captured chain ready for evaluation.
///
/// Evaluating a chain consumes it: the check entry points take chains by
/// value and a chain cannot be rebuilt after use.
pub trait Chain: Operands + Sized {
    /// Returns the overall truth value.
    fn holds(&self) -> bool;

    /// Renders the expanded `v0 op0 v1 ...` form.
    #[must_use]
    fn expansion(&self) -> String {
        let mut out = String::new();
        self.write_expansion(&mut out);
        out
    }
}

impl<T: Truthy> Chain for Head<T> {
    fn holds(&self) -> bool {
        self.operand.value().truthy()
    }
}

impl<P: Operands, B> Chain for Link<P, B> {
    fn holds(&self) -> bool {
        self.links_hold()
    }
}

/// Chain builders, one per relational operator.
///
/// Invoked fully qualified by the capture macros; each captures the
/// comparison as a plain `fn` pointer at the site where the bound holds.
pub trait ChainExt: Operands + Sized {
    /// Extends the chain with `== rhs`.
    #[must_use]
    fn eq<B>(self, rhs: Operand<B>) -> Link<Self, B>
    where
        Self::Last: PartialEq<B>,
    {
        Link {
            prev: self,
            op: Op::Eq,
            cmp: |a, b| a == b,
            operand: rhs,
        }
    }

    /// Extends the chain with `!= rhs`.
    #[must_use]
    fn ne<B>(self, rhs: Operand<B>) -> Link<Self, B>
    where
        Self::Last: PartialEq<B>,
    {
        Link {
            prev: self,
            op: Op::Ne,
            cmp: |a, b| a != b,
            operand: rhs,
        }
    }

    /// Extends the chain with `< rhs`.
    #[must_use]
    fn lt<B>(self, rhs: Operand<B>) -> Link<Self, B>
    where
        Self::Last: PartialOrd<B>,
    {
        Link {
            prev: self,
            op: Op::Lt,
            cmp: |a, b| a < b,
            operand: rhs,
        }
    }

    /// Extends the chain with `<= rhs`.
    #[must_use]
    fn le<B>(self, rhs: Operand<B>) -> Link<Self, B>
    where
        Self::Last: PartialOrd<B>,
    {
        Link {
            prev: self,
            op: Op::Le,
            cmp: |a, b| a <= b,
            operand: rhs,
        }
    }

    /// Extends the chain with `>= rhs`.
    #[must_use]
    fn ge<B>(self, rhs: Operand<B>) -> Link<Self, B>
    where
        Self::Last: PartialOrd<B>,
    {
        Link {
            prev: self,
            op: Op::Ge,
            cmp: |a, b| a >= b,
            operand: rhs,
        }
    }

    /// Extends the chain with `> rhs`.
    #[must_use]
    fn gt<B>(self, rhs: Operand<B>) -> Link<Self, B>
    where
        Self::Last: PartialOrd<B>,
    {
        Link {
            prev: self,
            op: Op::Gt,
            cmp: |a, b| a > b,
            operand: rhs,
        }
    }
}

impl<C: Operands> ChainExt for C {}

/// A captured two-operand expression for approximate comparison.
///
/// Approximate truth is only defined for exactly two operands, so the
/// approx entry points take this dedicated shape instead of a general
/// chain; longer chains are unrepresentable. No exact-comparison bound is
/// captured, which lets mixed numeric widths compare approximately.
pub struct ApproxPair<A, B> {
    lhs: Operand<A>,
    op: Op,
    rhs: Operand<B>,
}

impl<A, B> ApproxPair<A, B> {
    /// Captures a two-operand approximate comparison.
    #[must_use]
    pub fn new(lhs: Operand<A>, op: Op, rhs: Operand<B>) -> Self {
        Self { lhs, op, rhs }
    }

    /// The captured operator.
    #[must_use]
    pub fn op(&self) -> Op {
        self.op
    }

    /// Both captured operands.
    #[must_use]
    pub fn operands(&self) -> (&A, &B) {
        (self.lhs.value(), self.rhs.value())
    }

    /// Renders the expanded `lhs op rhs` form.
    #[must_use]
    pub fn expansion(&self) -> String {
        format!("{} {} {}", self.lhs.render(), self.op.symbol(), self.rhs.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operand<T: std::fmt::Debug>(value: T) -> Operand<T> {
        Operand::with(value, |v| format!("{v:?}"))
    }

    #[test]
    fn bare_truthy_head() {
        assert!(seed(operand(true)).holds());
        assert!(!seed(operand(false)).holds());
        assert!(seed(operand(Some(3))).holds());
        assert!(!seed(operand(None::<u8>)).holds());
        assert!(seed(operand(Ok::<_, ()>(1))).holds());
        assert!(!seed(operand(Err::<(), _>("nope"))).holds());
    }

    #[test]
    fn two_element_chain_truth() {
        assert!(ChainExt::eq(seed(operand(1)), operand(1)).holds());
        assert!(!ChainExt::eq(seed(operand(1)), operand(2)).holds());
        assert!(ChainExt::lt(seed(operand(1)), operand(2)).holds());
        assert!(!ChainExt::gt(seed(operand(1)), operand(2)).holds());
    }

    #[test]
    fn chain_is_left_associative_and_pairwise() {
        // 1 < 2 < 3 holds; 1 < 3 < 2 fails on the second pair.
        let good = ChainExt::lt(ChainExt::lt(seed(operand(1)), operand(2)), operand(3));
        assert!(good.holds());
        assert_eq!(good.arity(), 3);

        let bad = ChainExt::lt(ChainExt::lt(seed(operand(1)), operand(3)), operand(2));
        assert!(!bad.holds());
        assert_eq!(bad.expansion(), "1 < 3 < 2");
    }

    #[test]
    fn mixed_operand_types() {
        // String == &str via the user-visible PartialEq impl.
        let chain = ChainExt::eq(seed(operand(String::from("a"))), operand("a"));
        assert!(chain.holds());
    }

    #[test]
    fn expansion_names_every_operand() {
        let chain = ChainExt::le(
            ChainExt::lt(seed(operand(1)), operand(5)),
            operand(5),
        );
        assert_eq!(chain.expansion(), "1 < 5 <= 5");
    }

    #[test]
    fn approx_pair_reports_its_parts() {
        let pair = ApproxPair::new(operand(1.0_f64), Op::Eq, operand(2.0_f64));
        assert_eq!(pair.op(), Op::Eq);
        assert_eq!(pair.expansion(), "1.0 == 2.0");
        let (a, b) = pair.operands();
        assert!((*a - 1.0).abs() < f64::EPSILON);
        assert!((*b - 2.0).abs() < f64::EPSILON);
    }
}
