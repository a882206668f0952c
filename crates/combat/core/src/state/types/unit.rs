use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::ItemData;

use super::{
    Aura, AuraCollection, Power, PowerType, Spell, SpellCollection, SpellId, Timestamp, UnitId,
};

/// An in-progress cast.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastingState {
    pub spell_id: SpellId,
    pub ends_at: Timestamp,
    pub target: Option<UnitId>,
}

impl CastingState {
    pub fn remaining(&self, now: Timestamp) -> u64 {
        self.ends_at.saturating_sub(now)
    }
}

/// A combatant. Owned by the state store; callers rebuild it rather than mutate a shared copy.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub is_player: bool,
    pub health: Power,
    pub power: BTreeMap<PowerType, Power>,
    pub spells: SpellCollection,
    pub auras: AuraCollection,
    pub casting: Option<CastingState>,
    /// Haste rating in basis points (2500 = +25%).
    pub haste_bp: u32,
    /// Equipped items by item id.
    pub equipment: BTreeMap<u32, Arc<ItemData>>,
}

impl Unit {
    pub fn new(id: impl Into<UnitId>, name: impl Into<String>, max_health: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_player: false,
            health: Power::full(max_health),
            power: BTreeMap::new(),
            spells: SpellCollection::default(),
            auras: AuraCollection::default(),
            casting: None,
            haste_bp: 0,
            equipment: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn player(mut self) -> Self {
        self.is_player = true;
        self
    }

    #[must_use]
    pub fn with_power(mut self, kind: PowerType, power: Power) -> Self {
        self.power.insert(kind, power);
        self
    }

    #[must_use]
    pub fn with_spell(mut self, spell: Spell) -> Self {
        self.spells.insert(spell);
        self
    }

    #[must_use]
    pub fn with_aura(mut self, aura: Aura) -> Self {
        self.auras.insert(aura);
        self
    }

    /// Equips `item`. Spells it grants are learned separately.
    #[must_use]
    pub fn with_item(mut self, item: Arc<ItemData>) -> Self {
        self.equipment.insert(item.id, item);
        self
    }

    #[must_use]
    pub fn with_haste(mut self, haste_bp: u32) -> Self {
        self.haste_bp = haste_bp;
        self
    }

    #[must_use]
    pub fn with_health(mut self, health: Power) -> Self {
        self.health = health;
        self
    }

    #[must_use]
    pub fn with_casting(mut self, casting: Option<CastingState>) -> Self {
        self.casting = casting;
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.health.is_empty()
    }

    /// True while a cast is in progress at `now`.
    pub fn is_casting(&self, now: Timestamp) -> bool {
        self.casting
            .as_ref()
            .is_some_and(|casting| casting.ends_at > now)
    }

    pub fn power_of(&self, kind: PowerType) -> Option<Power> {
        self.power.get(&kind).copied()
    }

    pub fn spell(&self, id: SpellId) -> Option<&Spell> {
        self.spells.get(id)
    }

    pub fn aura(&self, id: SpellId) -> Option<&Aura> {
        self.auras.get(id)
    }
}
