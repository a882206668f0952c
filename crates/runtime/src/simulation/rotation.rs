//! Drives a [`RotationProvider`] through `AplEvaluate` events.
//!
//! At most one evaluation is pending at a time. Asking for an evaluation
//! earlier than the pending one replaces it; asking for a later one is a no-op.
use combat_core::Timestamp;
use tracing::debug;

use crate::api::{Result, RotationAction};
use crate::cast;
use crate::context::SimContext;
use crate::scheduler::{EventKind, ScheduledEvent};

/// Delay before asking again after the rotation's cast was refused.
pub const REJECTED_CAST_BACKOFF_MS: u64 = 100;

fn is_evaluation(event: &ScheduledEvent) -> bool {
    matches!(event.kind, EventKind::AplEvaluate)
}

/// Makes sure the rotation is consulted no later than `time`.
pub(crate) fn request_evaluation(ctx: &SimContext, time: Timestamp) -> Result<()> {
    if let Some(pending) = ctx.scheduler.earliest_where(is_evaluation) {
        if pending <= time {
            return Ok(());
        }
        ctx.scheduler.cancel_where(is_evaluation);
    }

    ctx.scheduler.schedule(ScheduledEvent::new(
        ctx.scheduler.fresh_id("apl_evaluate"),
        time,
        EventKind::AplEvaluate,
    ))
}

pub(crate) async fn evaluate(ctx: &SimContext) -> Result<()> {
    let Some(rotation) = ctx.rotation.as_ref() else {
        return Ok(());
    };
    let state = ctx.state.get_state();
    let now = state.current_time;

    match rotation.next_action(&state).await? {
        RotationAction::Cast {
            caster,
            spell_id,
            target,
        } => match cast::cast(ctx, &caster, spell_id, target).await {
            Ok(outcome) => request_evaluation(ctx, outcome.ready_at().max(now)),
            Err(err) if err.is_cast_rejection() => {
                debug!(
                    target: "runtime::sim",
                    caster = %caster,
                    spell_id = %spell_id,
                    time = now,
                    "rotation cast refused: {err}"
                );
                request_evaluation(ctx, now.saturating_add(REJECTED_CAST_BACKOFF_MS))
            }
            Err(err) => Err(err),
        },
        // A zero wait would re-evaluate forever at the same instant.
        RotationAction::Wait(ms) => request_evaluation(ctx, now.saturating_add(ms.max(1))),
        RotationAction::Idle => {
            debug!(target: "runtime::sim", time = now, "rotation idle");
            Ok(())
        }
    }
}
