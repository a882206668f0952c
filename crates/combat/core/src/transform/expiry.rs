//! Absolute-timestamp transforms for cooldowns and durations.

use crate::state::Timestamp;

/// Transform over an absolute expiry timestamp.
#[derive(Clone, Copy)]
pub struct Expiry<F> {
    current: Timestamp,
    build: F,
}

impl<F> Expiry<F> {
    pub fn new(current: Timestamp, build: F) -> Self {
        Self { current, build }
    }

    /// Returns the expiry the transform was seeded with.
    pub fn current(&self) -> Timestamp {
        self.current
    }
}

impl<T, F> Expiry<F>
where
    F: Fn(Timestamp, Timestamp) -> T,
{
    /// Starts a full `duration` from `time`.
    pub fn trigger(&self, duration: u64, time: Timestamp) -> T {
        (self.build)(time.saturating_add(duration), time)
    }

    /// Alias of [`Expiry::trigger`]: a refresh is a full reset.
    pub fn refresh(&self, duration: u64, time: Timestamp) -> T {
        self.trigger(duration, time)
    }

    /// Pulls the expiry earlier by `amount`, never before `time`.
    pub fn reduce(&self, amount: u64, time: Timestamp) -> T {
        let value = self.current.saturating_sub(amount).max(time);
        (self.build)(value, time)
    }

    /// Expires immediately.
    pub fn reset(&self, time: Timestamp) -> T {
        (self.build)(time, time)
    }

    /// Shifts the expiry by a signed delta.
    pub fn modify(&self, delta: i64, time: Timestamp) -> T {
        (self.build)(self.current.saturating_add_signed(delta), time)
    }

    /// Replaces the expiry outright.
    pub fn set(&self, value: Timestamp, time: Timestamp) -> T {
        (self.build)(value, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(current: Timestamp) -> Expiry<impl Fn(Timestamp, Timestamp) -> Timestamp> {
        Expiry::new(current, |value: Timestamp, _: Timestamp| value)
    }

    #[test]
    fn reduce_never_moves_before_now() {
        assert_eq!(raw(1000).reduce(5000, 900), 900);
        assert_eq!(raw(1000).reduce(50, 900), 950);
        assert_eq!(raw(0).reduce(u64::MAX, 10), 10);

        for current in (0..=2000).step_by(250) {
            for amount in [0, 1, 499, 1000, 5000, u64::MAX] {
                for time in [0, 900, 1500, 3000] {
                    assert!(raw(current).reduce(amount, time) >= time);
                }
            }
        }
    }

    #[test]
    fn trigger_and_refresh_reset_from_time() {
        assert_eq!(raw(4000).trigger(1500, 1000), 2500);
        assert_eq!(raw(4000).refresh(1500, 1000), 2500);
        assert_eq!(raw(0).trigger(u64::MAX, 10), u64::MAX);
    }

    #[test]
    fn modify_set_and_reset() {
        assert_eq!(raw(1000).modify(-300, 0), 700);
        assert_eq!(raw(1000).modify(250, 0), 1250);
        assert_eq!(raw(100).modify(-300, 0), 0);
        assert_eq!(raw(1000).set(42, 7), 42);
        assert_eq!(raw(1000).reset(640), 640);
    }
}
