//! Immutable simulation snapshot.
//!
//! A [`SimulationState`] is never edited in place by shared holders: the state
//! store hands an owned copy to an update function and installs whatever it
//! returns. Units sit behind `Arc`, so copying a snapshot only bumps reference
//! counts and [`SimulationState::update_unit`] clones just the unit it touches.
pub mod error;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use error::StateError;
pub use types::{
    Aura, AuraCollection, CastingState, Power, PowerType, Spell, SpellCollection, SpellId,
    Timestamp, Unit, UnitId,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationState {
    pub current_time: Timestamp,
    pub units: BTreeMap<UnitId, Arc<Unit>>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.units.insert(unit.id.clone(), Arc::new(unit));
        self
    }

    /// Moves the clock forward. Earlier timestamps are ignored so time never runs backwards.
    #[must_use]
    pub fn advance_to(mut self, time: Timestamp) -> Self {
        self.current_time = self.current_time.max(time);
        self
    }

    pub fn unit(&self, id: &UnitId) -> Result<&Arc<Unit>, StateError> {
        self.units
            .get(id)
            .ok_or_else(|| StateError::UnitNotFound(id.clone()))
    }

    /// First unit flagged as a player.
    pub fn player(&self) -> Option<&Arc<Unit>> {
        self.units.values().find(|unit| unit.is_player)
    }

    pub fn spell(&self, unit_id: &UnitId, spell_id: SpellId) -> Result<&Spell, StateError> {
        self.unit(unit_id)?
            .spell(spell_id)
            .ok_or_else(|| StateError::SpellNotFound {
                unit_id: unit_id.clone(),
                spell_id,
            })
    }

    pub fn aura(&self, unit_id: &UnitId, spell_id: SpellId) -> Result<&Aura, StateError> {
        self.unit(unit_id)?
            .aura(spell_id)
            .ok_or_else(|| StateError::AuraNotFound {
                unit_id: unit_id.clone(),
                spell_id,
            })
    }

    /// Replaces one unit with the result of `f`, leaving every other unit shared.
    pub fn update_unit<F>(mut self, id: &UnitId, f: F) -> Result<Self, StateError>
    where
        F: FnOnce(Unit) -> Unit,
    {
        let slot = self
            .units
            .get_mut(id)
            .ok_or_else(|| StateError::UnitNotFound(id.clone()))?;
        let unit = Unit::clone(slot);
        *slot = Arc::new(f(unit));
        Ok(self)
    }

    /// Like [`SimulationState::update_unit`], for updates that can reject.
    pub fn try_update_unit<F>(mut self, id: &UnitId, f: F) -> Result<Self, StateError>
    where
        F: FnOnce(Unit) -> Result<Unit, StateError>,
    {
        let slot = self
            .units
            .get_mut(id)
            .ok_or_else(|| StateError::UnitNotFound(id.clone()))?;
        let unit = Unit::clone(slot);
        *slot = Arc::new(f(unit)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SimulationState {
        SimulationState::new()
            .with_unit(Unit::new("player", "Mage", 1000).player())
            .with_unit(Unit::new("enemy-1", "Dummy", 50_000))
    }

    #[test]
    fn clock_is_monotonic() {
        let state = state().advance_to(500).advance_to(200);
        assert_eq!(state.current_time, 500);
    }

    #[test]
    fn update_unit_leaves_original_untouched() {
        let before = state();
        let enemy = UnitId::from("enemy-1");
        let after = before
            .clone()
            .update_unit(&enemy, |unit| {
                let health = unit.health.transform().decrement(400, 0);
                unit.with_health(health)
            })
            .unwrap();

        assert_eq!(before.unit(&enemy).unwrap().health.current, 50_000);
        assert_eq!(after.unit(&enemy).unwrap().health.current, 49_600);

        let player = UnitId::from("player");
        assert!(Arc::ptr_eq(
            before.unit(&player).unwrap(),
            after.unit(&player).unwrap()
        ));
    }

    #[test]
    fn missing_lookups() {
        let state = state();
        let ghost = UnitId::from("ghost");
        assert_eq!(
            state.unit(&ghost).unwrap_err(),
            StateError::UnitNotFound(ghost.clone())
        );
        assert!(matches!(
            state.spell(&UnitId::from("player"), SpellId(1)),
            Err(StateError::SpellNotFound { .. })
        ));
        assert!(state.clone().update_unit(&ghost, |unit| unit).is_err());
        assert_eq!(state.player().unwrap().id, UnitId::from("player"));
    }
}
