//! Cast service: validates a cast request, applies its immediate effects and
//! schedules the start and completion events.
//!
//! The modifier pipeline's `before_cast` phase runs before validation, so a
//! modifier can change what is being validated (e.g. make a spell instant).
//! Charges and cooldowns are spent when the cast starts; `on_cast` runs
//! later, when the completion event fires.
use std::sync::Arc;

use combat_core::{
    CombatLogEvent, SimError, SimulationState, Spell, SpellId, SpellRef, Subevent, Timestamp,
    UnitId, begin_cast, validate_cast,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::api::Result;
use crate::context::SimContext;
use crate::scheduler::{EventKind, ScheduledEvent};

/// One cast in flight, as seen by modifiers and event payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpellCast {
    /// Unique per cast; events derived from the cast build their ids from it.
    pub cast_id: String,
    pub caster: UnitId,
    pub caster_name: String,
    /// The spell after `before_cast`.
    pub spell: Spell,
    pub target: Option<UnitId>,
    pub target_name: Option<String>,
    pub started_at: Timestamp,
    pub completes_at: Timestamp,
}

impl SpellCast {
    pub fn spell_id(&self) -> SpellId {
        self.spell.id()
    }

    /// Event id for something derived from this cast, e.g. `derived_id("impact")`.
    pub fn derived_id(&self, suffix: &str) -> String {
        format!("{}/{suffix}", self.cast_id)
    }

    /// Combat-log record for this cast, with destination fields when there is a target.
    pub fn log_event(&self, subevent: Subevent, timestamp: Timestamp) -> CombatLogEvent {
        let event = CombatLogEvent::new(
            timestamp,
            subevent,
            self.caster.clone(),
            self.caster_name.clone(),
        )
        .with_spell(SpellRef::from(self.spell.info.as_ref()));

        match (&self.target, &self.target_name) {
            (Some(id), Some(name)) => event.with_dest(id.clone(), name.clone()),
            _ => event,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastOutcome {
    pub cast: SpellCast,
    pub started_at: Timestamp,
    pub completes_at: Timestamp,
    /// End of the global cooldown, for spells that trigger it.
    pub gcd_ends_at: Option<Timestamp>,
}

impl CastOutcome {
    /// When the caster is next free to act.
    pub fn ready_at(&self) -> Timestamp {
        self.completes_at.max(self.gcd_ends_at.unwrap_or(0))
    }
}

/// Starts casting `spell_id` at the current simulated time.
///
/// Validation and the immediate effects (global cooldown, charge, cooldown,
/// casting state) happen in one state update, so casts issued back to back at
/// the same timestamp see each other's spent charges and cooldowns.
pub async fn cast(
    ctx: &SimContext,
    caster: &UnitId,
    spell_id: SpellId,
    target: Option<UnitId>,
) -> Result<CastOutcome> {
    let state = ctx.state.get_state();
    let now = state.current_time;
    let caster_name = state.unit(caster)?.name.clone();
    let spell = state.spell(caster, spell_id)?.clone();

    let pipeline = ctx.pipelines.for_spell(spell_id);
    let adjusted = pipeline.before_cast(ctx, caster, spell).await?;

    let cast_config = ctx.config.cast_config();
    let target = target.or_else(|| ctx.config.default_target.clone());
    let mut checked = None;
    let mut target_name = None;

    let updated = ctx.state.try_update_state(|state| -> Result<SimulationState> {
        // Charges and readiness come from the latest snapshot, static data from `before_cast`.
        let spell = Spell {
            info: Arc::clone(&adjusted.info),
            ..state.spell(caster, spell_id)?.clone()
        };
        if let Err(err) = validate_cast(state.unit(caster)?, &spell, now, &cast_config) {
            debug!(
                target: "runtime::cast",
                caster = %caster,
                spell_id = %spell_id,
                code = err.error_code(),
                "cast validation failed: {err}"
            );
            return Err(err.into());
        }
        if let Some(id) = &target {
            target_name = Some(state.unit(id)?.name.clone());
        }

        let state = state.update_unit(caster, |unit| {
            begin_cast(unit, &spell, target.clone(), now, &cast_config)
        })?;
        checked = Some(spell);
        Ok(state)
    })?;
    let spell = checked.unwrap_or(adjusted);

    let gcd_ends_at = if spell.info.triggers_gcd() {
        Some(updated.unit(caster)?.spells.category_expiry(cast_config.gcd_category))
    } else {
        None
    };

    let completes_at = now.saturating_add(spell.info.cast_time_ms);
    let cast = SpellCast {
        cast_id: ctx.scheduler.fresh_id(&format!("cast_{spell_id}")),
        caster: caster.clone(),
        caster_name,
        spell,
        target,
        target_name,
        started_at: now,
        completes_at,
    };

    ctx.scheduler.schedule(ScheduledEvent::new(
        cast.derived_id("start"),
        now,
        EventKind::CastStart(Box::new(cast.clone())),
    ))?;
    ctx.scheduler.schedule(ScheduledEvent::new(
        cast.derived_id("complete"),
        completes_at,
        EventKind::CastComplete(Box::new(cast.clone())),
    ))?;
    schedule_recovery(ctx, &cast)?;

    debug!(
        target: "runtime::cast",
        cast_id = %cast.cast_id,
        caster = %caster,
        spell_id = %spell_id,
        time = now,
        completes_at,
        "cast started"
    );

    Ok(CastOutcome {
        cast,
        started_at: now,
        completes_at,
        gcd_ends_at,
    })
}

/// Schedules the charge and cooldown recovery started by `cast`.
fn schedule_recovery(ctx: &SimContext, cast: &SpellCast) -> Result<()> {
    let info = &cast.spell.info;
    let spell_id = cast.spell_id();

    if info.has_charges() && info.charge_recovery_time_ms > 0 {
        ctx.scheduler.schedule(ScheduledEvent::new(
            cast.derived_id("charge_ready"),
            cast.started_at.saturating_add(info.charge_recovery_time_ms),
            EventKind::ChargeReady {
                unit: cast.caster.clone(),
                spell_id,
            },
        ))?;
    }
    if info.recovery_time_ms > 0 {
        ctx.scheduler.schedule(ScheduledEvent::new(
            cast.derived_id("cooldown_ready"),
            cast.started_at.saturating_add(info.recovery_time_ms),
            EventKind::CooldownReady {
                unit: cast.caster.clone(),
                spell_id,
            },
        ))?;
    }

    trace!(
        target: "runtime::cast",
        cast_id = %cast.cast_id,
        recovery = info.recovery_time_ms,
        charge_recovery = info.charge_recovery_time_ms,
        "recovery scheduled"
    );
    Ok(())
}

/// Same lookups and validation as [`cast`], without `before_cast` or side effects.
pub fn can_cast(ctx: &SimContext, caster: &UnitId, spell_id: SpellId) -> Result<()> {
    let state = ctx.state.get_state();
    let unit = state.unit(caster)?;
    let spell = state.spell(caster, spell_id)?;
    validate_cast(unit, spell, state.current_time, &ctx.config.cast_config())?;
    Ok(())
}
