use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::AuraDataFlat;
use crate::transform::{Bounded, Expiry};

use super::{SpellId, Timestamp, UnitId};

/// An aura instance on a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aura {
    pub caster_unit_id: UnitId,
    pub spell_id: SpellId,
    pub info: Arc<AuraDataFlat>,
    pub stacks: u32,
    pub expires_at: Timestamp,
    /// Time of the latest application or refresh.
    pub applied_at: Timestamp,
}

impl Aura {
    /// Applies `info` at `now` for its (possibly hasted) base duration.
    /// A zero base duration never expires.
    pub fn apply(
        caster: UnitId,
        info: Arc<AuraDataFlat>,
        stacks: u32,
        now: Timestamp,
        haste_bp: u32,
    ) -> Self {
        let duration = info.effective_duration(haste_bp);
        Self {
            caster_unit_id: caster,
            spell_id: info.spell_id,
            stacks: stacks.clamp(1, info.max_stacks.max(1)),
            expires_at: if duration == 0 {
                Timestamp::MAX
            } else {
                now.saturating_add(duration)
            },
            applied_at: now,
            info,
        }
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at == Timestamp::MAX
    }

    pub fn remaining(&self, now: Timestamp) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    /// Reapplication at `now` per the aura's refresh behavior, with the same
    /// haste scaling [`Aura::apply`] uses.
    #[must_use]
    pub fn refreshed(&self, now: Timestamp, haste_bp: u32) -> Aura {
        let expires_at = if self.is_permanent() {
            self.expires_at
        } else {
            self.info.refreshed_expiry(self.expires_at, now, haste_bp)
        };
        Aura {
            expires_at,
            applied_at: now,
            ..self.clone()
        }
    }

    /// Transform over the stack count, clamped to `[0, max_stacks]`.
    pub fn stacks(&self) -> Bounded<impl Fn(i64, Timestamp) -> Aura + use<>> {
        let aura = self.clone();
        Bounded::new(
            i64::from(self.stacks),
            0,
            i64::from(self.info.max_stacks.max(1)),
            move |value: i64, _: Timestamp| Aura {
                stacks: u32::try_from(value).unwrap_or(0),
                ..aura.clone()
            },
        )
    }

    /// Transform over the expiry timestamp.
    pub fn expiry(&self) -> Expiry<impl Fn(Timestamp, Timestamp) -> Aura + use<>> {
        let aura = self.clone();
        Expiry::new(self.expires_at, move |value: Timestamp, _: Timestamp| Aura {
            expires_at: value,
            ..aura.clone()
        })
    }
}

/// Auras on a unit keyed by spell id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraCollection {
    pub auras: BTreeMap<SpellId, Aura>,
}

impl AuraCollection {
    pub fn get(&self, id: SpellId) -> Option<&Aura> {
        self.auras.get(&id)
    }

    pub fn contains(&self, id: SpellId) -> bool {
        self.auras.contains_key(&id)
    }

    pub fn insert(&mut self, aura: Aura) {
        self.auras.insert(aura.spell_id, aura);
    }

    pub fn remove(&mut self, id: SpellId) -> Option<Aura> {
        self.auras.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.auras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auras.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aura> {
        self.auras.values()
    }

    /// Auras still running at `now`.
    pub fn active(&self, now: Timestamp) -> impl Iterator<Item = &Aura> {
        self.auras.values().filter(move |aura| aura.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot() -> Arc<AuraDataFlat> {
        Arc::new(AuraDataFlat::new(SpellId(589), 12_000).pandemic(15_600))
    }

    #[test]
    fn pandemic_refresh_stays_under_cap() {
        let aura = Aura::apply(UnitId::from("player"), dot(), 1, 0, 0);
        assert_eq!(aura.expires_at, 12_000);

        let refreshed = aura.refreshed(10_000, 0);
        assert_eq!(refreshed.applied_at, 10_000);
        assert_eq!(refreshed.expires_at, 24_000);
        assert!(refreshed.expires_at <= refreshed.applied_at + 15_600);

        for at in (0..12_000).step_by(500) {
            let again = aura.refreshed(at, 0);
            assert!(again.expires_at <= again.applied_at + 15_600);
        }
    }

    #[test]
    fn hasted_aura_keeps_haste_on_refresh() {
        let info = Arc::new(AuraDataFlat {
            duration_hasted: true,
            ..AuraDataFlat::new(SpellId(8921), 12_000)
        });
        let aura = Aura::apply(UnitId::from("player"), info, 1, 0, 2_500);
        assert_eq!(aura.expires_at, 9_600);

        // Duration refresh: a fresh hasted duration, not the 12 s base.
        let refreshed = aura.refreshed(1_000, 2_500);
        assert_eq!(refreshed.expires_at, 1_000 + 9_600);
        assert_eq!(
            refreshed.expires_at - refreshed.applied_at,
            aura.expires_at - aura.applied_at
        );
    }

    #[test]
    fn stacks_clamp_to_max() {
        let info = Arc::new(AuraDataFlat::new(SpellId(1), 10_000).with_max_stacks(3));
        let aura = Aura::apply(UnitId::from("player"), info, 1, 0, 0);
        assert_eq!(aura.stacks().increment(5, 0).stacks, 3);
        assert_eq!(aura.stacks().decrement(5, 0).stacks, 0);
    }

    #[test]
    fn zero_duration_is_permanent() {
        let info = Arc::new(AuraDataFlat::new(SpellId(2), 0));
        let aura = Aura::apply(UnitId::from("player"), info, 1, 100, 0);
        assert!(aura.is_permanent());
        assert!(aura.refreshed(5_000, 0).is_permanent());
    }

    #[test]
    fn activity_follows_expiry() {
        let aura = Aura::apply(UnitId::from("player"), dot(), 1, 0, 0);
        assert!(aura.is_active(11_999));
        assert!(!aura.is_active(12_000));
        assert!(!aura.expiry().reset(5_000).is_active(5_000));
    }
}
