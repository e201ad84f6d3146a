//! Operand rendering with graceful degradation.
//!
//! A captured operand pairs the moved value with a bare `fn(&T) -> String`
//! chosen at the capture site, so nothing is rendered (and nothing is
//! allocated for rendering) unless an assertion actually fails.
//!
//! Selection runs through three tiers, resolved by autoref at the macro
//! expansion site:
//!
//! 1. `Display` renders as the user would print the value,
//! 2. `Debug` renders the `{:?}` form,
//! 3. anything else degrades to a `{TypeName}` placeholder.
//!
//! The tier traits share a method name on successively less-referenced
//! `Probe` receivers; method resolution walks the autoderef chain and picks
//! the first tier whose bound holds for the operand type.

use core::fmt;
use core::marker::PhantomData;

/// A captured operand: the value plus its pre-selected renderer.
pub struct Operand<T> {
    value: T,
    renderer: fn(&T) -> String,
}

impl<T> Operand<T> {
    /// Pairs a value with the renderer selected for its type.
    #[must_use]
    pub fn with(value: T, renderer: fn(&T) -> String) -> Self {
        Self { value, renderer }
    }

    /// Returns the captured value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Renders the captured value.
    #[must_use]
    pub fn render(&self) -> String {
        (self.renderer)(&self.value)
    }
}

impl<T> fmt::Debug for Operand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operand")
            .field("rendered", &self.render())
            .finish()
    }
}

/// Zero-sized anchor for renderer selection.
pub struct Probe<T>(PhantomData<fn() -> T>);

impl<T> Probe<T> {
    /// Builds a probe for the type of `value`.
    #[must_use]
    pub fn of(_value: &T) -> Self {
        Self(PhantomData)
    }
}

/// First tier: types with a `Display` impl.
pub trait DisplayTier {
    /// The operand type being probed.
    type Value;
    /// Returns the renderer for the probed type.
    fn render_fn(&self) -> fn(&Self::Value) -> String;
}

impl<T: fmt::Display> DisplayTier for &&Probe<T> {
    type Value = T;

    fn render_fn(&self) -> fn(&T) -> String {
        |value| value.to_string()
    }
}

/// Second tier: types with a `Debug` impl only.
pub trait DebugTier {
    /// The operand type being probed.
    type Value;
    /// Returns the renderer for the probed type.
    fn render_fn(&self) -> fn(&Self::Value) -> String;
}

impl<T: fmt::Debug> DebugTier for &Probe<T> {
    type Value = T;

    fn render_fn(&self) -> fn(&T) -> String {
        |value| format!("{value:?}")
    }
}

/// Last tier: the type-name placeholder.
pub trait OpaqueTier {
    /// The operand type being probed.
    type Value;
    /// Returns the renderer for the probed type.
    fn render_fn(&self) -> fn(&Self::Value) -> String;
}

impl<T> OpaqueTier for Probe<T> {
    type Value = T;

    fn render_fn(&self) -> fn(&T) -> String {
        |_| format!("{{{}}}", core::any::type_name::<T>())
    }
}
