use async_trait::async_trait;

use crate::api::Result;
use crate::cast::SpellCast;
use crate::context::SimContext;
use crate::modifiers::SpellModifier;
use crate::scheduler::{EventKind, ScheduledEvent};

/// Launches a projectile for damaging spells with a target. Impact lands
/// after the spell's travel time (immediately when it has none).
#[derive(Clone, Copy, Debug, Default)]
pub struct ProjectileModifier;

#[async_trait]
impl SpellModifier for ProjectileModifier {
    fn name(&self) -> &str {
        "projectile"
    }

    async fn on_cast(&self, ctx: &SimContext, cast: &SpellCast) -> Result<()> {
        if cast.spell.info.base_damage == 0 || cast.target.is_none() {
            return Ok(());
        }

        let impact_at = ctx.now().saturating_add(cast.spell.info.travel_time_ms);
        ctx.scheduler.schedule_once(ScheduledEvent::new(
            cast.derived_id("impact"),
            impact_at,
            EventKind::ProjectileImpact(Box::new(cast.clone())),
        ))?;
        Ok(())
    }
}
