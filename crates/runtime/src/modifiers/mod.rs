//! Spell modifiers and the pipeline that composes them.
//!
//! A modifier hooks into up to four phases of a spell's lifecycle. The
//! pipeline runs `before_cast` sequentially (each modifier sees the previous
//! one's spell) and fans the other phases out concurrently, wrapping every
//! call with a timeout and a bounded retry.
//!
//! # Phases
//!
//! - `before_cast`: may transform the spell before validation
//! - `on_cast`: the cast completed (resources, projectiles)
//! - `on_hit`: a projectile or direct effect landed
//! - `on_damage`: damage from the spell was dealt
//!
//! A call that times out is run again, so the concurrent phases should be
//! safe to repeat for the same cast. Events derived from a cast go through
//! [`EventScheduler::schedule_once`](crate::scheduler::EventScheduler::schedule_once).
pub mod base;
mod pipeline;

pub use base::{CasterStateModifier, ProjectileModifier, ResourceModifier};
pub use pipeline::{ModifierPipeline, PipelineSet};

use async_trait::async_trait;
use combat_core::{Spell, UnitId};

use crate::api::Result;
use crate::cast::SpellCast;
use crate::context::SimContext;

/// Named point in a spell's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    BeforeCast,
    OnCast,
    OnHit,
    OnDamage,
}

/// Optional behaviour attached to spells. Every phase defaults to a no-op.
///
/// Modifiers are stateless descriptors: they read and write simulation state
/// only through the [`SimContext`] they are handed.
#[async_trait]
pub trait SpellModifier: Send + Sync {
    fn name(&self) -> &str;

    async fn before_cast(&self, _ctx: &SimContext, _caster: &UnitId, spell: Spell) -> Result<Spell> {
        Ok(spell)
    }

    async fn on_cast(&self, _ctx: &SimContext, _cast: &SpellCast) -> Result<()> {
        Ok(())
    }

    async fn on_hit(&self, _ctx: &SimContext, _cast: &SpellCast) -> Result<()> {
        Ok(())
    }

    async fn on_damage(&self, _ctx: &SimContext, _cast: &SpellCast, _amount: u64) -> Result<()> {
        Ok(())
    }
}
