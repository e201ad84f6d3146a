//! Author-facing macro surface.
//!
//! The check macros munch the expression tokens to rebuild the relational
//! structure: operands accumulate token by token until one of the six
//! relational operators appears at the top level, each operand is captured
//! by move with its renderer, and the operators become chain-builder calls.
//! Token munching cannot see into unparenthesized generics, so an operand
//! containing `<` in a type position (`Vec::<i32>::new()`) must be wrapped
//! in parentheses.

/// Registers a top-level case with the process-global registry.
///
/// ```
/// casewalk::test_case!("arithmetic", |cx| {
///     casewalk::check!(cx, 1 + 1 == 2);
/// });
/// let report = casewalk::run_tests().expect("engine error");
/// assert!(report.success());
/// ```
#[macro_export]
macro_rules! test_case {
    ($name:expr, $body:expr $(,)?) => {
        $crate::registry::register($name, $body)
    };
}

/// Opens a scoped subcase in the current body.
///
/// The same context binding is reused inside the block:
///
/// ```
/// fn body(cx: &mut casewalk::TestCx) {
///     casewalk::subcase!(cx, "small inputs", {
///         casewalk::check!(cx, 1 < 2);
///     });
/// }
/// ```
#[macro_export]
macro_rules! subcase {
    ($cx:ident, $name:expr, $body:block) => {
        $cx.subcase($name, |$cx: &mut $crate::TestCx| $body)
    };
}

/// Executes a block `n` times as sub-iterations of a synthetic subcase,
/// labelling each iteration with its index as the section.
#[macro_export]
macro_rules! repeat {
    ($cx:ident, $count:expr, $body:block) => {
        $cx.repeat($count, |$cx: &mut $crate::TestCx| $body)
    };
}

/// Asserts that an expression is truthy, capturing operand values.
///
/// Relational operators may chain: `check!(cx, a < b < c)` holds iff both
/// adjacent comparisons hold, and a failure renders every operand.
#[macro_export]
macro_rules! check {
    ($cx:expr, $($expr:tt)+) => {
        $cx.check(
            $crate::runner::Assertion::new(file!(), line!(), stringify!($($expr)+)),
            || $crate::__chain!(@head [] $($expr)+),
        )
    };
}

/// Asserts a two-operand comparison numerically within the active
/// precision.
#[macro_export]
macro_rules! check_approx {
    ($cx:expr, $($expr:tt)+) => {
        $cx.check_approx(
            $crate::runner::Assertion::new(file!(), line!(), stringify!($($expr)+)),
            || $crate::__approx_pair!(@head [] $($expr)+),
        )
    };
}

/// Compares two sequences elementwise in lock-step.
#[macro_export]
macro_rules! check_each {
    ($cx:expr, $($expr:tt)+) => {
        $cx.check_each(
            $crate::runner::Assertion::new(file!(), line!(), stringify!($($expr)+)),
            || $crate::__each_pair!(@head [] $($expr)+),
        )
    };
}

/// Compares two sequences elementwise within the active precision.
#[macro_export]
macro_rules! check_each_approx {
    ($cx:expr, $($expr:tt)+) => {
        $cx.check_each_approx(
            $crate::runner::Assertion::new(file!(), line!(), stringify!($($expr)+)),
            || $crate::__each_pair_approx!(@head [] $($expr)+),
        )
    };
}

/// Asserts that evaluating an expression does not panic; the value is
/// discarded.
#[macro_export]
macro_rules! check_noexcept {
    ($cx:expr, $($expr:tt)+) => {
        $cx.check_noexcept(
            $crate::runner::Assertion::new(file!(), line!(), stringify!($($expr)+)),
            || {
                let _ = $($expr)+;
            },
        )
    };
}

/// Chain muncher: accumulates operand tokens, seeds the chain at the first
/// relational operator, extends it at each further one.
#[doc(hidden)]
#[macro_export]
macro_rules! __chain {
    (@head [$($a:tt)+] == $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::seed($crate::__operand!($($a)+))) eq [] $($r)+)
    };
    (@head [$($a:tt)+] != $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::seed($crate::__operand!($($a)+))) ne [] $($r)+)
    };
    (@head [$($a:tt)+] <= $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::seed($crate::__operand!($($a)+))) le [] $($r)+)
    };
    (@head [$($a:tt)+] < $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::seed($crate::__operand!($($a)+))) lt [] $($r)+)
    };
    (@head [$($a:tt)+] >= $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::seed($crate::__operand!($($a)+))) ge [] $($r)+)
    };
    (@head [$($a:tt)+] > $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::seed($crate::__operand!($($a)+))) gt [] $($r)+)
    };
    (@head [$($a:tt)+]) => {
        $crate::capture::seed($crate::__operand!($($a)+))
    };
    (@head [$($a:tt)*] $t:tt $($r:tt)*) => {
        $crate::__chain!(@head [$($a)* $t] $($r)*)
    };

    (@tail ($ch:expr) $m:ident [$($a:tt)+] == $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::ChainExt::$m($ch, $crate::__operand!($($a)+))) eq [] $($r)+)
    };
    (@tail ($ch:expr) $m:ident [$($a:tt)+] != $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::ChainExt::$m($ch, $crate::__operand!($($a)+))) ne [] $($r)+)
    };
    (@tail ($ch:expr) $m:ident [$($a:tt)+] <= $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::ChainExt::$m($ch, $crate::__operand!($($a)+))) le [] $($r)+)
    };
    (@tail ($ch:expr) $m:ident [$($a:tt)+] < $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::ChainExt::$m($ch, $crate::__operand!($($a)+))) lt [] $($r)+)
    };
    (@tail ($ch:expr) $m:ident [$($a:tt)+] >= $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::ChainExt::$m($ch, $crate::__operand!($($a)+))) ge [] $($r)+)
    };
    (@tail ($ch:expr) $m:ident [$($a:tt)+] > $($r:tt)+) => {
        $crate::__chain!(@tail ($crate::capture::ChainExt::$m($ch, $crate::__operand!($($a)+))) gt [] $($r)+)
    };
    (@tail ($ch:expr) $m:ident [$($a:tt)+]) => {
        $crate::capture::ChainExt::$m($ch, $crate::__operand!($($a)+))
    };
    (@tail ($ch:expr) $m:ident [$($a:tt)*] $t:tt $($r:tt)*) => {
        $crate::__chain!(@tail ($ch) $m [$($a)* $t] $($r)*)
    };
}

/// Two-operand muncher for approximate comparison: everything after the
/// first relational operator is the right operand.
#[doc(hidden)]
#[macro_export]
macro_rules! __approx_pair {
    (@head [$($a:tt)+] == $($r:tt)+) => {
        $crate::capture::ApproxPair::new(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Eq,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] != $($r:tt)+) => {
        $crate::capture::ApproxPair::new(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Ne,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] <= $($r:tt)+) => {
        $crate::capture::ApproxPair::new(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Le,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] < $($r:tt)+) => {
        $crate::capture::ApproxPair::new(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Lt,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] >= $($r:tt)+) => {
        $crate::capture::ApproxPair::new(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Ge,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] > $($r:tt)+) => {
        $crate::capture::ApproxPair::new(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Gt,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+]) => {
        compile_error!("expected a relational comparison between two operands")
    };
    (@head [$($a:tt)*] $t:tt $($r:tt)*) => {
        $crate::__approx_pair!(@head [$($a)* $t] $($r)*)
    };
}

/// Two-operand muncher for exact elementwise comparison; captures the
/// element comparator where the element types' bounds hold.
#[doc(hidden)]
#[macro_export]
macro_rules! __each_pair {
    (@head [$($a:tt)+] == $($r:tt)+) => {
        $crate::each::each_pair(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Eq,
            |__a, __b| __a == __b,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] != $($r:tt)+) => {
        $crate::each::each_pair(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Ne,
            |__a, __b| __a != __b,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] <= $($r:tt)+) => {
        $crate::each::each_pair(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Le,
            |__a, __b| __a <= __b,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] < $($r:tt)+) => {
        $crate::each::each_pair(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Lt,
            |__a, __b| __a < __b,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] >= $($r:tt)+) => {
        $crate::each::each_pair(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Ge,
            |__a, __b| __a >= __b,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] > $($r:tt)+) => {
        $crate::each::each_pair(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Gt,
            |__a, __b| __a > __b,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+]) => {
        compile_error!("expected a relational comparison between two operands")
    };
    (@head [$($a:tt)*] $t:tt $($r:tt)*) => {
        $crate::__each_pair!(@head [$($a)* $t] $($r)*)
    };
}

/// Two-operand muncher for approximate elementwise comparison; no exact
/// comparator is captured so mixed numeric widths stay comparable.
#[doc(hidden)]
#[macro_export]
macro_rules! __each_pair_approx {
    (@head [$($a:tt)+] == $($r:tt)+) => {
        $crate::each::each_pair_approx(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Eq,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] != $($r:tt)+) => {
        $crate::each::each_pair_approx(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Ne,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] <= $($r:tt)+) => {
        $crate::each::each_pair_approx(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Le,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] < $($r:tt)+) => {
        $crate::each::each_pair_approx(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Lt,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] >= $($r:tt)+) => {
        $crate::each::each_pair_approx(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Ge,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+] > $($r:tt)+) => {
        $crate::each::each_pair_approx(
            $crate::__operand!($($a)+),
            $crate::compare::Op::Gt,
            $crate::__operand!($($r)+),
        )
    };
    (@head [$($a:tt)+]) => {
        compile_error!("expected a relational comparison between two operands")
    };
    (@head [$($a:tt)*] $t:tt $($r:tt)*) => {
        $crate::__each_pair_approx!(@head [$($a)* $t] $($r)*)
    };
}

/// Captures one operand by move together with its renderer, selected by
/// autoref through the printer tiers.
#[doc(hidden)]
#[macro_export]
macro_rules! __operand {
    ($($v:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::printer::{DebugTier as _, DisplayTier as _, OpaqueTier as _};
        let __value = $($v)+;
        let __renderer = (&&&$crate::printer::Probe::of(&__value)).render_fn();
        $crate::printer::Operand::with(__value, __renderer)
    }};
}
