use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::SpellInfo;
use crate::transform::{Bounded, Expiry};

use super::{SpellId, Timestamp};

/// A unit's runtime instance of a [`SpellInfo`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spell {
    pub info: Arc<SpellInfo>,
    pub charges: u32,
    pub cooldown_expiry: Timestamp,
    pub is_ready: bool,
}

impl Spell {
    /// A ready spell with every charge available.
    pub fn new(info: Arc<SpellInfo>) -> Self {
        Self {
            charges: info.max_charges,
            cooldown_expiry: 0,
            is_ready: true,
            info,
        }
    }

    pub fn id(&self) -> SpellId {
        self.info.id
    }

    pub fn cooldown_remaining(&self, now: Timestamp) -> u64 {
        self.cooldown_expiry.saturating_sub(now)
    }

    /// Transform over the charge count, clamped to `[0, max_charges]`.
    pub fn charges(&self) -> Bounded<impl Fn(i64, Timestamp) -> Spell + use<>> {
        let spell = self.clone();
        Bounded::new(
            i64::from(self.charges),
            0,
            i64::from(self.info.max_charges),
            move |value: i64, _: Timestamp| Spell {
                charges: u32::try_from(value).unwrap_or(0),
                ..spell.clone()
            },
        )
    }

    /// Transform over the cooldown expiry. Readiness follows the new expiry.
    pub fn cooldown(&self) -> Expiry<impl Fn(Timestamp, Timestamp) -> Spell + use<>> {
        let spell = self.clone();
        Expiry::new(
            self.cooldown_expiry,
            move |value: Timestamp, time: Timestamp| Spell {
                cooldown_expiry: value,
                is_ready: value <= time,
                ..spell.clone()
            },
        )
    }

    /// Starts the recovery cooldown at `now`. Spells without a cooldown stay ready.
    #[must_use]
    pub fn start_cooldown(&self, now: Timestamp) -> Spell {
        if self.info.recovery_time_ms == 0 {
            return self.clone();
        }
        self.cooldown().trigger(self.info.recovery_time_ms, now)
    }

    /// Marks the spell ready, as observed by a cooldown-ready event.
    #[must_use]
    pub fn ready(&self) -> Spell {
        Spell {
            is_ready: true,
            ..self.clone()
        }
    }
}

/// The spells a unit knows plus shared cooldown categories (the GCD among them).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellCollection {
    pub spells: BTreeMap<SpellId, Spell>,
    /// Category id -> expiry timestamp.
    pub cooldown_categories: BTreeMap<u32, Timestamp>,
}

impl SpellCollection {
    pub fn get(&self, id: SpellId) -> Option<&Spell> {
        self.spells.get(&id)
    }

    pub fn insert(&mut self, spell: Spell) {
        self.spells.insert(spell.id(), spell);
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spell> {
        self.spells.values()
    }

    /// Expiry of a cooldown category, 0 when it was never triggered.
    pub fn category_expiry(&self, category: u32) -> Timestamp {
        self.cooldown_categories.get(&category).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charged() -> Spell {
        Spell::new(Arc::new(
            SpellInfo::new(SpellId(20271), "Judgment").with_charges(2, 9000),
        ))
    }

    #[test]
    fn charges_never_exceed_max() {
        let spell = charged();
        assert_eq!(spell.charges, 2);

        let spent = spell.charges().decrement(1, 100);
        assert_eq!(spent.charges, 1);
        assert_eq!(spent.charges().increment(5, 200).charges, 2);
        assert_eq!(spent.charges().decrement(5, 200).charges, 0);
    }

    #[test]
    fn cooldown_tracks_readiness() {
        let spell = Spell::new(Arc::new(
            SpellInfo::new(SpellId(1), "Strike").with_cooldown(1500),
        ));

        let cooling = spell.start_cooldown(0);
        assert_eq!(cooling.cooldown_expiry, 1500);
        assert!(!cooling.is_ready);
        assert_eq!(cooling.cooldown_remaining(500), 1000);

        let reduced = cooling.cooldown().reduce(2000, 400);
        assert_eq!(reduced.cooldown_expiry, 400);
        assert!(reduced.is_ready);
    }

    #[test]
    fn no_cooldown_stays_ready() {
        let spell = Spell::new(Arc::new(SpellInfo::new(SpellId(2), "Bolt")));
        assert!(spell.start_cooldown(10).is_ready);
    }
}
