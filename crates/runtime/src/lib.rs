//! Async orchestration for the discrete-event combat simulation.
//!
//! This crate owns the mutable side of a run: the state store holding the
//! current immutable snapshot, the time-ordered event scheduler, the combat
//! event bus, the spell modifier pipeline and the loop that drives them.
//! Rules and records live in `combat-core`.
//!
//! Modules are organized by responsibility:
//! - [`simulation`] hosts the run loop and its builder
//! - [`api`] exposes errors and the rotation abstraction
//! - [`store`] and [`scheduler`] hold the shared state and the event queue
//! - [`combat`] provides the combat-log bus and its built-in handlers
//! - [`modifiers`] composes per-spell behaviour around cast, hit and damage
//! - [`oracle`] provides an in-memory metadata source
pub mod api;
pub mod cast;
pub mod combat;
pub mod config;
pub mod context;
pub mod modifiers;
pub mod oracle;
pub mod scheduler;
pub mod simulation;
pub mod store;

pub use api::{
    IdleRotation, ModifierError, ModifierFailure, Result, RotationAction, RotationProvider,
    RuntimeError,
};
pub use cast::{CastOutcome, SpellCast, can_cast};
pub use combat::{CombatEventBus, Emitter, Filter, HandlerContext, HandlerId};
pub use config::{RetryPolicy, SimulationConfig};
pub use context::SimContext;
pub use modifiers::{ModifierPipeline, Phase, PipelineSet, SpellModifier};
pub use oracle::InMemoryMetadata;
pub use scheduler::{EventKind, EventScheduler, EventTrace, ScheduledEvent};
pub use simulation::{RunSummary, SimStatus, Simulation, SimulationBuilder};
pub use store::StateStore;
