//! Unit-level accessors over the state store.
//!
//! Each accessor is a single serialized update that replaces one unit inside
//! the snapshot.
use std::sync::Arc;

use combat_core::{Aura, PowerType, Spell, SpellId, StateError, Unit, UnitId};

use super::StateStore;

impl StateStore {
    pub fn unit(&self, id: &UnitId) -> Result<Arc<Unit>, StateError> {
        self.get_state().unit(id).map(Arc::clone)
    }

    pub fn add_unit(&self, unit: Unit) {
        self.update_state(|state| state.with_unit(unit));
    }

    pub fn remove_unit(&self, id: &UnitId) -> Result<Arc<Unit>, StateError> {
        let mut removed = None;
        self.try_update_state(|mut state| {
            removed = state.units.remove(id);
            match removed {
                Some(_) => Ok(state),
                None => Err(StateError::UnitNotFound(id.clone())),
            }
        })?;
        removed.ok_or_else(|| StateError::UnitNotFound(id.clone()))
    }

    /// Replaces `id` with `f(unit)` and returns the new unit.
    pub fn update_unit<F>(&self, id: &UnitId, f: F) -> Result<Arc<Unit>, StateError>
    where
        F: FnOnce(Unit) -> Unit,
    {
        let state = self.try_update_state(|state| state.update_unit(id, f))?;
        state.unit(id).map(Arc::clone)
    }

    /// Lowers health, clamped at 0.
    pub fn damage(&self, id: &UnitId, amount: u64) -> Result<Arc<Unit>, StateError> {
        let amount = i64::try_from(amount).unwrap_or(i64::MAX);
        self.update_unit(id, |unit| {
            let health = unit.health.transform().decrement(amount, 0);
            unit.with_health(health)
        })
    }

    /// Raises health, clamped at max.
    pub fn heal(&self, id: &UnitId, amount: u64) -> Result<Arc<Unit>, StateError> {
        let amount = i64::try_from(amount).unwrap_or(i64::MAX);
        self.update_unit(id, |unit| {
            let health = unit.health.transform().increment(amount, 0);
            unit.with_health(health)
        })
    }

    pub fn set_health(&self, id: &UnitId, value: u32) -> Result<Arc<Unit>, StateError> {
        self.update_unit(id, |unit| {
            let health = unit.health.transform().set(i64::from(value), 0);
            unit.with_health(health)
        })
    }

    /// Spends `amount` of a resource, clamped at 0. Units without that pool are unchanged.
    pub fn consume_power(
        &self,
        id: &UnitId,
        kind: PowerType,
        amount: u32,
    ) -> Result<Arc<Unit>, StateError> {
        self.update_unit(id, |unit| match unit.power_of(kind) {
            Some(pool) => {
                let pool = pool.transform().decrement(i64::from(amount), 0);
                unit.with_power(kind, pool)
            }
            None => unit,
        })
    }

    pub fn regenerate_power(
        &self,
        id: &UnitId,
        kind: PowerType,
        amount: u32,
    ) -> Result<Arc<Unit>, StateError> {
        self.update_unit(id, |unit| match unit.power_of(kind) {
            Some(pool) => {
                let pool = pool.transform().increment(i64::from(amount), 0);
                unit.with_power(kind, pool)
            }
            None => unit,
        })
    }

    /// Passive mana regeneration for every player: 5% of max mana per second of `interval_ms`.
    pub fn regenerate_all(&self, interval_ms: u64) {
        self.update_state(|mut state| {
            for unit in state.units.values_mut().filter(|unit| unit.is_player) {
                let Some(mana) = unit.power_of(PowerType::Mana) else {
                    continue;
                };
                let amount = u64::from(mana.max).saturating_mul(interval_ms) / 20_000;
                let mana = mana
                    .transform()
                    .increment(i64::try_from(amount).unwrap_or(i64::MAX), 0);
                *unit = Arc::new(Unit::clone(unit).with_power(PowerType::Mana, mana));
            }
            state
        });
    }

    pub fn update_spell<F>(
        &self,
        unit_id: &UnitId,
        spell_id: SpellId,
        f: F,
    ) -> Result<Spell, StateError>
    where
        F: FnOnce(Spell) -> Spell,
    {
        let state = self.try_update_state(|state| {
            state.try_update_unit(unit_id, |mut unit| {
                let spell = unit
                    .spells
                    .get(spell_id)
                    .cloned()
                    .ok_or_else(|| StateError::SpellNotFound {
                        unit_id: unit_id.clone(),
                        spell_id,
                    })?;
                unit.spells.insert(f(spell));
                Ok(unit)
            })
        })?;
        state.spell(unit_id, spell_id).cloned()
    }

    pub fn add_aura(&self, unit_id: &UnitId, aura: Aura) -> Result<Arc<Unit>, StateError> {
        self.update_unit(unit_id, |unit| unit.with_aura(aura))
    }

    pub fn remove_aura(&self, unit_id: &UnitId, spell_id: SpellId) -> Result<Aura, StateError> {
        let mut removed = None;
        self.try_update_state(|state| {
            state.try_update_unit(unit_id, |mut unit| {
                removed = unit.auras.remove(spell_id);
                Ok(unit)
            })
        })?;
        removed.ok_or_else(|| StateError::AuraNotFound {
            unit_id: unit_id.clone(),
            spell_id,
        })
    }

    pub fn update_aura<F>(
        &self,
        unit_id: &UnitId,
        spell_id: SpellId,
        f: F,
    ) -> Result<Aura, StateError>
    where
        F: FnOnce(Aura) -> Aura,
    {
        let state = self.try_update_state(|state| {
            state.try_update_unit(unit_id, |mut unit| {
                let aura = unit
                    .auras
                    .get(spell_id)
                    .cloned()
                    .ok_or_else(|| StateError::AuraNotFound {
                        unit_id: unit_id.clone(),
                        spell_id,
                    })?;
                unit.auras.insert(f(aura));
                Ok(unit)
            })
        })?;
        state.aura(unit_id, spell_id).cloned()
    }
}
