//! Clamped numeric transforms for stacks, charges and resource pools.

use crate::state::Timestamp;

/// Transform over a value that must stay within `[min, max]`.
///
/// `build` receives the clamped value and the call's timestamp and returns the
/// owning entity rebuilt around it.
#[derive(Clone, Copy)]
pub struct Bounded<F> {
    current: i64,
    min: i64,
    max: i64,
    build: F,
}

impl<F> Bounded<F> {
    /// Creates a transform for `current` within `[min, max]`.
    ///
    /// An inverted range collapses to `min`, so results are always well defined.
    pub fn new(current: i64, min: i64, max: i64, build: F) -> Self {
        Self {
            current,
            min,
            max: max.max(min),
            build,
        }
    }

    /// Returns the raw value the transform was seeded with.
    pub fn current(&self) -> i64 {
        self.current
    }

    fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }
}

impl<T, F> Bounded<F>
where
    F: Fn(i64, Timestamp) -> T,
{
    /// Adds `amount`, saturating at `max`.
    pub fn increment(&self, amount: i64, time: Timestamp) -> T {
        self.modify(amount, time)
    }

    /// Subtracts `amount`, saturating at `min`.
    pub fn decrement(&self, amount: i64, time: Timestamp) -> T {
        self.modify(amount.saturating_neg(), time)
    }

    /// Applies a signed delta.
    pub fn modify(&self, delta: i64, time: Timestamp) -> T {
        let value = self.clamp(self.current.saturating_add(delta));
        (self.build)(value, time)
    }

    /// Replaces the value outright (still clamped).
    pub fn set(&self, value: i64, time: Timestamp) -> T {
        (self.build)(self.clamp(value), time)
    }
}
