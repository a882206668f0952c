//! Aura lifecycle handlers: application, refresh, stacks, removal and periodic ticks.
use combat_core::{Aura, CombatLogEvent, PeriodicType, SpellId, Subevent, Timestamp, UnitId};
use tracing::{debug, trace};

use crate::api::Result;
use crate::combat::{Emitter, HandlerContext};

use super::damage::{apply_damage, restore_power};

fn subject(event: &CombatLogEvent) -> Option<(UnitId, SpellId)> {
    Some((event.affected_unit().clone(), event.spell_id()?))
}

fn stack_amount(event: &CombatLogEvent) -> u32 {
    event
        .amount
        .map_or(1, |amount| u32::try_from(amount).unwrap_or(u32::MAX))
}

pub(super) fn applied(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    emitter: &mut Emitter,
) -> Result<()> {
    let Some((target, spell_id)) = subject(event) else {
        return Ok(());
    };
    if ctx.state.get_state().aura(&target, spell_id).is_ok() {
        return refresh_existing(event, ctx, emitter, &target, spell_id);
    }
    apply_new(event, ctx, emitter, &target, spell_id)
}

pub(super) fn refresh(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    emitter: &mut Emitter,
) -> Result<()> {
    let Some((target, spell_id)) = subject(event) else {
        return Ok(());
    };
    if ctx.state.get_state().aura(&target, spell_id).is_err() {
        return apply_new(event, ctx, emitter, &target, spell_id);
    }
    refresh_existing(event, ctx, emitter, &target, spell_id)
}

fn apply_new(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    emitter: &mut Emitter,
    target: &UnitId,
    spell_id: SpellId,
) -> Result<()> {
    let info = ctx.metadata.aura(spell_id)?;
    let haste = ctx.state.unit(target)?.haste_bp;
    let aura = Aura::apply(
        event.source_guid.clone(),
        info,
        stack_amount(event),
        ctx.now,
        haste,
    );
    ctx.state.add_aura(target, aura.clone())?;

    debug!(
        target: "runtime::bus",
        unit = %target,
        spell_id = %spell_id,
        expires_at = aura.expires_at,
        "aura applied"
    );

    schedule_removal(event, &aura, ctx.now, emitter);
    if let Some(tick) = tick_event(event, &aura, haste) {
        emitter.emit_after(aura.info.first_tick_delay(haste), tick);
    }
    Ok(())
}

/// Recomputes the expiry per the aura's refresh behaviour. Tick cadence is left alone.
fn refresh_existing(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    emitter: &mut Emitter,
    target: &UnitId,
    spell_id: SpellId,
) -> Result<()> {
    let now = ctx.now;
    let haste = ctx.state.unit(target)?.haste_bp;
    let aura = ctx
        .state
        .update_aura(target, spell_id, |aura| aura.refreshed(now, haste))?;

    debug!(
        target: "runtime::bus",
        unit = %target,
        spell_id = %spell_id,
        expires_at = aura.expires_at,
        "aura refreshed"
    );

    schedule_removal(event, &aura, now, emitter);
    Ok(())
}

fn schedule_removal(event: &CombatLogEvent, aura: &Aura, now: Timestamp, emitter: &mut Emitter) {
    if aura.is_permanent() || aura.expires_at <= now {
        return;
    }
    let removal = event
        .follow_up(Subevent::SpellAuraRemoved, now)
        .with_expiry(aura.expires_at);
    emitter.emit_after(aura.expires_at - now, removal);
}

fn tick_event(event: &CombatLogEvent, aura: &Aura, haste_bp: u32) -> Option<CombatLogEvent> {
    if !aura.info.is_periodic() {
        return None;
    }
    let subevent = match aura.info.periodic_type? {
        PeriodicType::Damage | PeriodicType::Leech => Subevent::SpellPeriodicDamage,
        PeriodicType::Heal => Subevent::SpellPeriodicHeal,
        PeriodicType::Energize => Subevent::SpellEnergize,
        PeriodicType::TriggerSpell => return None,
    };
    let amount = aura
        .info
        .tick_amount
        .saturating_mul(u64::from(aura.stacks.max(1)));

    Some(
        event
            .follow_up(subevent, event.timestamp)
            .with_amount(amount)
            .with_tick_period(aura.info.effective_tick_period(haste_bp).max(1)),
    )
}

pub(super) fn dose_applied(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    _emitter: &mut Emitter,
) -> Result<()> {
    let Some((target, spell_id)) = subject(event) else {
        return Ok(());
    };
    let amount = i64::from(stack_amount(event));
    let now = ctx.now;
    let aura = ctx
        .state
        .update_aura(&target, spell_id, |aura| aura.stacks().increment(amount, now))?;
    trace!(target: "runtime::bus", unit = %target, spell_id = %spell_id, stacks = aura.stacks, "aura dose applied");
    Ok(())
}

/// Removes stacks; the aura goes away when none are left.
pub(super) fn dose_removed(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    _emitter: &mut Emitter,
) -> Result<()> {
    let Some((target, spell_id)) = subject(event) else {
        return Ok(());
    };
    let amount = i64::from(stack_amount(event));
    let now = ctx.now;
    let aura = ctx
        .state
        .update_aura(&target, spell_id, |aura| aura.stacks().decrement(amount, now))?;
    if aura.stacks == 0 {
        ctx.state.remove_aura(&target, spell_id)?;
    }
    Ok(())
}

/// Removes the aura once its expiry has been reached. A scheduled removal
/// left behind by a refresh finds a later expiry and is ignored. Removals
/// without a scheduled expiry are explicit clears and always apply.
pub(super) fn removed(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    _emitter: &mut Emitter,
) -> Result<()> {
    let Some((target, spell_id)) = subject(event) else {
        return Ok(());
    };
    let Ok(aura) = ctx.state.get_state().aura(&target, spell_id).cloned() else {
        trace!(target: "runtime::bus", unit = %target, spell_id = %spell_id, "aura already gone");
        return Ok(());
    };

    if event.expires_at.is_some() && aura.expires_at > ctx.now {
        trace!(
            target: "runtime::bus",
            unit = %target,
            spell_id = %spell_id,
            expires_at = aura.expires_at,
            "stale aura removal ignored"
        );
        return Ok(());
    }

    ctx.state.remove_aura(&target, spell_id)?;
    debug!(target: "runtime::bus", unit = %target, spell_id = %spell_id, "aura removed");
    Ok(())
}

/// Applies one periodic tick and schedules the next while it lands within the aura.
pub(super) fn periodic(
    event: &CombatLogEvent,
    ctx: &HandlerContext<'_>,
    emitter: &mut Emitter,
) -> Result<()> {
    if event.tick_period_ms.is_none() {
        return Ok(());
    }
    let Some((target, spell_id)) = subject(event) else {
        return Ok(());
    };
    let Ok(aura) = ctx.state.get_state().aura(&target, spell_id).cloned() else {
        trace!(target: "runtime::bus", unit = %target, spell_id = %spell_id, "tick without aura skipped");
        return Ok(());
    };
    if aura.expires_at < ctx.now {
        return Ok(());
    }

    let amount = event.amount.unwrap_or(0);
    match event.subevent {
        Subevent::SpellPeriodicDamage => apply_damage(event, ctx, &target, amount, emitter)?,
        Subevent::SpellPeriodicHeal => {
            ctx.state.heal(&target, amount)?;
        }
        _ => restore_power(event, ctx, &target)?,
    }

    let haste = ctx.state.unit(&target)?.haste_bp;
    if let Some(next) = tick_event(event, &aura, haste) {
        let period = next.tick_period_ms.unwrap_or(1);
        if ctx.now.saturating_add(period) <= aura.expires_at {
            emitter.emit_after(period, next);
        }
    }
    Ok(())
}
