//! Asynchronous abstraction for rotation / action-priority-list logic.
//!
//! The simulation asks a [`RotationProvider`] what to do whenever the actor
//! becomes free, so runs can be driven by scripted fixtures or full APLs.
use async_trait::async_trait;
use combat_core::{SimulationState, SpellId, UnitId};

use super::errors::Result;

/// What the rotation wants to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RotationAction {
    Cast {
        caster: UnitId,
        spell_id: SpellId,
        target: Option<UnitId>,
    },
    /// Ask again after this many milliseconds.
    Wait(u64),
    /// Stop evaluating for the rest of the run.
    Idle,
}

#[async_trait]
pub trait RotationProvider: Send + Sync {
    /// Decide the next action from a read-only snapshot.
    async fn next_action(&self, state: &SimulationState) -> Result<RotationAction>;
}

/// A rotation that never acts.
pub struct IdleRotation;

#[async_trait]
impl RotationProvider for IdleRotation {
    async fn next_action(&self, _state: &SimulationState) -> Result<RotationAction> {
        Ok(RotationAction::Idle)
    }
}
