use async_trait::async_trait;

use crate::api::Result;
use crate::cast::SpellCast;
use crate::context::SimContext;
use crate::modifiers::SpellModifier;

/// Clears the caster's casting state once the cast it describes completes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CasterStateModifier;

#[async_trait]
impl SpellModifier for CasterStateModifier {
    fn name(&self) -> &str {
        "caster_state"
    }

    async fn on_cast(&self, ctx: &SimContext, cast: &SpellCast) -> Result<()> {
        let spell_id = cast.spell_id();
        ctx.state.update_unit(&cast.caster, |unit| {
            let finished = unit
                .casting
                .as_ref()
                .is_some_and(|casting| casting.spell_id == spell_id);
            if finished { unit.with_casting(None) } else { unit }
        })?;
        Ok(())
    }
}
