//! Static spell definition.

use crate::state::{PowerType, SpellId};

/// Immutable spell data shared by every runtime [`crate::Spell`] instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct SpellInfo {
    pub id: SpellId,
    pub name: String,

    /// Cast time in milliseconds; 0 for instant casts.
    pub cast_time_ms: u64,
    /// Cooldown in milliseconds; 0 when the spell has no cooldown.
    pub recovery_time_ms: u64,
    /// Global cooldown triggered by the cast; 0 for off-GCD spells.
    pub start_recovery_time_ms: u64,

    /// Maximum charges; 0 when the spell does not use charges.
    pub max_charges: u32,
    pub charge_recovery_time_ms: u64,

    pub power_type: Option<PowerType>,
    pub power_cost: u32,

    /// Direct damage dealt on impact; 0 for spells without a damage component.
    pub base_damage: u64,
    /// Delay between cast completion and impact.
    pub travel_time_ms: u64,
    pub school_mask: u32,
}

impl Default for SpellInfo {
    fn default() -> Self {
        Self {
            id: SpellId(0),
            name: String::new(),
            cast_time_ms: 0,
            recovery_time_ms: 0,
            start_recovery_time_ms: 1500,
            max_charges: 0,
            charge_recovery_time_ms: 0,
            power_type: None,
            power_cost: 0,
            base_damage: 0,
            travel_time_ms: 0,
            school_mask: 1,
        }
    }
}

impl SpellInfo {
    pub fn new(id: SpellId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cast_time(mut self, cast_time_ms: u64) -> Self {
        self.cast_time_ms = cast_time_ms;
        self
    }

    #[must_use]
    pub fn with_cooldown(mut self, recovery_time_ms: u64) -> Self {
        self.recovery_time_ms = recovery_time_ms;
        self
    }

    #[must_use]
    pub fn with_charges(mut self, max_charges: u32, charge_recovery_time_ms: u64) -> Self {
        self.max_charges = max_charges;
        self.charge_recovery_time_ms = charge_recovery_time_ms;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, power_type: PowerType, power_cost: u32) -> Self {
        self.power_type = Some(power_type);
        self.power_cost = power_cost;
        self
    }

    #[must_use]
    pub fn with_damage(mut self, base_damage: u64, travel_time_ms: u64) -> Self {
        self.base_damage = base_damage;
        self.travel_time_ms = travel_time_ms;
        self
    }

    #[must_use]
    pub fn off_gcd(mut self) -> Self {
        self.start_recovery_time_ms = 0;
        self
    }

    pub fn has_charges(&self) -> bool {
        self.max_charges > 0
    }

    pub fn triggers_gcd(&self) -> bool {
        self.start_recovery_time_ms > 0
    }
}
