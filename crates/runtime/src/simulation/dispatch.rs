//! Default behaviour for events scheduled without an explicit action.
use combat_core::Subevent;
use tracing::trace;

use crate::api::Result;
use crate::context::SimContext;
use crate::scheduler::{EventKind, ScheduledEvent};

use super::rotation;

pub(crate) async fn run_default(ctx: &SimContext, kind: EventKind) -> Result<()> {
    let now = ctx.now();

    match kind {
        EventKind::CastStart(cast) => {
            ctx.bus.emit(cast.log_event(Subevent::SpellCastStart, now));
        }
        EventKind::CastComplete(cast) => {
            ctx.pipelines
                .for_spell(cast.spell_id())
                .on_cast(ctx, &cast)
                .await?;
            ctx.bus.emit(cast.log_event(Subevent::SpellCastSuccess, now));
        }
        EventKind::ProjectileImpact(cast) => {
            let pipeline = ctx.pipelines.for_spell(cast.spell_id());
            pipeline.on_hit(ctx, &cast).await?;

            let amount = cast.spell.info.base_damage;
            ctx.bus
                .emit(cast.log_event(Subevent::SpellDamage, now).with_amount(amount));
            pipeline.on_damage(ctx, &cast, amount).await?;
        }
        EventKind::CooldownReady { unit, spell_id } => {
            // A later cast may have restarted the cooldown.
            ctx.state.update_spell(&unit, spell_id, |spell| {
                if spell.cooldown_expiry <= now {
                    spell.ready()
                } else {
                    spell
                }
            })?;
        }
        EventKind::ChargeReady { unit, spell_id } => {
            ctx.state
                .update_spell(&unit, spell_id, |spell| spell.charges().increment(1, now))?;
        }
        EventKind::CombatLog(event) | EventKind::AuraExpire(event) => {
            ctx.bus.emit(*event);
        }
        EventKind::PeriodicPower { interval_ms } => {
            ctx.state.regenerate_all(interval_ms);
            if interval_ms > 0 {
                ctx.scheduler.schedule(ScheduledEvent::new(
                    ctx.scheduler.fresh_id("periodic_power"),
                    now.saturating_add(interval_ms),
                    EventKind::PeriodicPower { interval_ms },
                ))?;
            }
        }
        EventKind::AplEvaluate => rotation::evaluate(ctx).await?,
        EventKind::Custom { name, .. } => {
            trace!(target: "runtime::sim", name = %name, "custom event without action");
        }
    }
    Ok(())
}
