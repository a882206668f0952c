//! Static game data consumed by the simulation.
//!
//! Records here are produced outside the engine (DBC-derived tables, JSON
//! fixtures) and never change during a run. The runtime reaches them through
//! the [`MetadataOracle`] trait.
mod aura;
mod item;
mod oracle;
mod spell;

pub use aura::{AuraDataFlat, PeriodicType, RefreshBehavior};
pub use item::ItemData;
pub use oracle::{MetadataError, MetadataOracle};
pub use spell::SpellInfo;
