//! Combat-log shaped domain events.
//!
//! These are the records that flow through the combat event bus. They follow
//! the layout of the game's combat log: a subevent tag, source and optional
//! destination unit, the spell involved and a few payload fields.

use crate::data::SpellInfo;
use crate::state::{PowerType, SpellId, Timestamp, UnitId};

/// Combat-log subevent tags.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Subevent {
    SpellCastStart,
    SpellCastSuccess,
    SpellDamage,
    SpellPeriodicDamage,
    SpellPeriodicHeal,
    SpellHeal,
    SpellEnergize,
    SpellAuraApplied,
    SpellAuraAppliedDose,
    SpellAuraRemoved,
    SpellAuraRemovedDose,
    SpellAuraRefresh,
    SpellSummon,
    SwingDamage,
    UnitDied,
}

impl Subevent {
    pub fn is_damage(self) -> bool {
        matches!(
            self,
            Self::SpellDamage | Self::SpellPeriodicDamage | Self::SwingDamage
        )
    }

    pub fn is_heal(self) -> bool {
        matches!(self, Self::SpellHeal | Self::SpellPeriodicHeal)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuraType {
    Buff,
    Debuff,
}

/// Spell prefix of a combat-log line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellRef {
    pub id: SpellId,
    pub name: String,
    pub school: u32,
}

impl From<&SpellInfo> for SpellRef {
    fn from(info: &SpellInfo) -> Self {
        Self {
            id: info.id,
            name: info.name.clone(),
            school: info.school_mask,
        }
    }
}

impl SpellRef {
    pub fn bare(id: SpellId) -> Self {
        Self {
            id,
            name: String::new(),
            school: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CombatLogEvent {
    pub timestamp: Timestamp,
    pub subevent: Subevent,
    pub source_guid: UnitId,
    pub source_name: String,
    pub dest_guid: Option<UnitId>,
    pub dest_name: Option<String>,
    pub spell: Option<SpellRef>,
    pub amount: Option<u64>,
    pub aura_type: Option<AuraType>,
    /// Resource restored by `SPELL_ENERGIZE`.
    pub power_type: Option<PowerType>,
    pub critical: bool,
    pub tick_period_ms: Option<u64>,
    /// Expiry a scheduled `SPELL_AURA_REMOVED` was created for.
    pub expires_at: Option<Timestamp>,
}

impl CombatLogEvent {
    pub fn new(
        timestamp: Timestamp,
        subevent: Subevent,
        source_guid: UnitId,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            subevent,
            source_guid,
            source_name: source_name.into(),
            dest_guid: None,
            dest_name: None,
            spell: None,
            amount: None,
            aura_type: None,
            power_type: None,
            critical: false,
            tick_period_ms: None,
            expires_at: None,
        }
    }

    /// Same event with a different tag and time, keeping source, destination and spell.
    #[must_use]
    pub fn follow_up(&self, subevent: Subevent, timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            subevent,
            amount: None,
            critical: false,
            tick_period_ms: None,
            expires_at: None,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_dest(mut self, guid: UnitId, name: impl Into<String>) -> Self {
        self.dest_guid = Some(guid);
        self.dest_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_spell(mut self, spell: SpellRef) -> Self {
        self.spell = Some(spell);
        self
    }

    #[must_use]
    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn with_aura_type(mut self, aura_type: AuraType) -> Self {
        self.aura_type = Some(aura_type);
        self
    }

    #[must_use]
    pub fn with_power_type(mut self, power_type: PowerType) -> Self {
        self.power_type = Some(power_type);
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, tick_period_ms: u64) -> Self {
        self.tick_period_ms = Some(tick_period_ms);
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn spell_id(&self) -> Option<SpellId> {
        self.spell.as_ref().map(|spell| spell.id)
    }

    /// True when both destination fields are present.
    pub fn has_target(&self) -> bool {
        self.dest_guid.is_some() && self.dest_name.is_some()
    }

    /// The unit an aura or damage event lands on: destination, falling back to source.
    pub fn affected_unit(&self) -> &UnitId {
        self.dest_guid.as_ref().unwrap_or(&self.source_guid)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn subevent_names_match_combat_log() {
        assert_eq!(Subevent::SpellAuraAppliedDose.to_string(), "SPELL_AURA_APPLIED_DOSE");
        assert_eq!(Subevent::from_str("UNIT_DIED"), Ok(Subevent::UnitDied));
        assert!(Subevent::SwingDamage.is_damage());
        assert!(!Subevent::SpellEnergize.is_heal());
    }

    #[test]
    fn follow_up_keeps_participants() {
        let hit = CombatLogEvent::new(100, Subevent::SpellDamage, UnitId::from("player"), "Mage")
            .with_dest(UnitId::from("enemy-1"), "Dummy")
            .with_spell(SpellRef::bare(SpellId(133)))
            .with_amount(500)
            .critical();

        let died = hit.follow_up(Subevent::UnitDied, 100);
        assert!(died.has_target());
        assert_eq!(died.spell_id(), Some(SpellId(133)));
        assert_eq!(died.amount, None);
        assert!(!died.critical);
        assert_eq!(died.affected_unit(), &UnitId::from("enemy-1"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_camel_case() {
        let event = CombatLogEvent::new(5, Subevent::SpellCastSuccess, UnitId::from("player"), "Mage");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["subevent"], "SPELL_CAST_SUCCESS");
        assert_eq!(json["sourceGuid"], "player");
    }
}
