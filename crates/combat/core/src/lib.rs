//! Deterministic combat rules and data types shared by the simulation runtime.
//!
//! `combat-core` defines the immutable simulation records (units, spells, auras,
//! resource pools), the transform algebra used to derive new versions of those
//! records, static spell/aura metadata, cast validation and the combat-log event
//! record. Everything here is synchronous and pure: the async orchestration
//! (scheduler, event bus, modifier pipeline) lives in `combat-runtime`.
pub mod cast;
pub mod combat_log;
pub mod data;
pub mod error;
pub mod state;
pub mod transform;

pub use cast::{CastConfig, CastError, begin_cast, validate_cast};
pub use combat_log::{AuraType, CombatLogEvent, SpellRef, Subevent};
pub use data::{
    AuraDataFlat, ItemData, MetadataError, MetadataOracle, PeriodicType, RefreshBehavior,
    SpellInfo,
};
pub use error::{ErrorSeverity, SimError};
pub use state::{
    Aura, AuraCollection, CastingState, Power, PowerType, SimulationState, Spell, SpellCollection,
    SpellId, StateError, Timestamp, Unit, UnitId,
};
pub use transform::{Bounded, Expiry};
