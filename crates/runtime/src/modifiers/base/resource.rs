use async_trait::async_trait;
use combat_core::{CastError, Spell, UnitId};

use crate::api::Result;
use crate::cast::SpellCast;
use crate::context::SimContext;
use crate::modifiers::SpellModifier;

/// Rejects casts the caster cannot pay for and spends the cost on completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResourceModifier;

#[async_trait]
impl SpellModifier for ResourceModifier {
    fn name(&self) -> &str {
        "resource"
    }

    async fn before_cast(&self, ctx: &SimContext, caster: &UnitId, spell: Spell) -> Result<Spell> {
        let Some(kind) = spell.info.power_type else {
            return Ok(spell);
        };
        let cost = spell.info.power_cost;
        if cost == 0 {
            return Ok(spell);
        }

        let available = ctx
            .state
            .unit(caster)?
            .power_of(kind)
            .map_or(0, |pool| pool.current);
        if available < cost {
            return Err(CastError::rejected(
                spell.id(),
                format!("not enough {kind}: {available}/{cost}"),
            )
            .into());
        }
        Ok(spell)
    }

    // One state update and no await, so a timeout can never interrupt it halfway.
    async fn on_cast(&self, ctx: &SimContext, cast: &SpellCast) -> Result<()> {
        let info = &cast.spell.info;
        if let Some(kind) = info.power_type {
            if info.power_cost > 0 {
                ctx.state.consume_power(&cast.caster, kind, info.power_cost)?;
            }
        }
        Ok(())
    }
}
