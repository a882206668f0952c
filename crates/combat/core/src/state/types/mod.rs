//! Simulation record types.
mod aura;
mod common;
mod power;
mod spell;
mod unit;

pub use aura::{Aura, AuraCollection};
pub use common::{PowerType, SpellId, Timestamp, UnitId};
pub use power::Power;
pub use spell::{Spell, SpellCollection};
pub use unit::{CastingState, Unit};
