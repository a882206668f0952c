use crate::transform::Bounded;

use super::Timestamp;

/// Resource pool (health, mana, energy...). `current` always lies in `[0, max]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Power {
    pub current: u32,
    pub max: u32,
}

impl Power {
    /// A full pool.
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    pub fn missing(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    /// Clamped transform over `current`.
    pub fn transform(&self) -> Bounded<impl Fn(i64, Timestamp) -> Power + use<>> {
        let max = self.max;
        Bounded::new(
            i64::from(self.current),
            0,
            i64::from(max),
            move |value: i64, _: Timestamp| Power {
                current: u32::try_from(value).unwrap_or(max),
                max,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_stay_in_range() {
        let mana = Power::new(40, 100);
        assert_eq!(mana.transform().decrement(60, 0), Power::new(0, 100));
        assert_eq!(mana.transform().increment(200, 0), Power::full(100));
        assert_eq!(mana.transform().set(-5, 0).current, 0);
        assert_eq!(mana.transform().modify(10, 0).current, 50);
    }

    #[test]
    fn new_clamps_current() {
        assert_eq!(Power::new(150, 100).current, 100);
        assert_eq!(Power::new(150, 100).missing(), 0);
        assert!(Power::new(0, 100).is_empty());
    }
}
