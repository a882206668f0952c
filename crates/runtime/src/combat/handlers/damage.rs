use combat_core::{CombatLogEvent, PowerType, Subevent, UnitId};
use tracing::debug;

use crate::api::Result;
use crate::combat::{Emitter, HandlerContext};

pub(super) fn damage(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    emitter: &mut Emitter,
) -> Result<()> {
    apply_damage(event, ctx, event.affected_unit(), event.amount.unwrap_or(0), emitter)
}

/// Lowers `target`'s health and emits `UNIT_DIED` when it drops to zero.
pub(super) fn apply_damage(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    target: &UnitId,
    amount: u64,
    emitter: &mut Emitter,
) -> Result<()> {
    if !ctx.state.unit(target)?.is_alive() {
        return Ok(());
    }

    let unit = ctx.state.damage(target, amount)?;
    if !unit.is_alive() {
        debug!(target: "runtime::bus", unit = %unit.id, time = ctx.now, "unit died");
        emitter.emit(
            CombatLogEvent::new(
                ctx.now,
                Subevent::UnitDied,
                event.source_guid.clone(),
                event.source_name.clone(),
            )
            .with_dest(unit.id.clone(), unit.name.clone()),
        );
    }
    Ok(())
}

pub(super) fn heal(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    _emitter: &mut Emitter,
) -> Result<()> {
    ctx.state
        .heal(event.affected_unit(), event.amount.unwrap_or(0))?;
    Ok(())
}

/// Direct energize. Periodic energize ticks belong to the periodic handler.
pub(super) fn energize(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    _emitter: &mut Emitter,
) -> Result<()> {
    if event.tick_period_ms.is_some() {
        return Ok(());
    }
    restore_power(event, ctx, event.affected_unit())
}

pub(super) fn restore_power(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    target: &UnitId,
) -> Result<()> {
    let amount = u32::try_from(event.amount.unwrap_or(0)).unwrap_or(u32::MAX);
    let kind = event.power_type.unwrap_or(PowerType::Mana);
    ctx.state.regenerate_power(target, kind, amount)?;
    Ok(())
}
