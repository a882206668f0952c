//! Cast validation and the immediate effects of starting a cast.
//!
//! Validation runs in a fixed order and the first failing check wins:
//! casting, cooldown, charges, global cooldown.
mod error;

pub use error::CastError;

use crate::state::{CastingState, Spell, Timestamp, Unit, UnitId};

/// Cooldown category that holds the global cooldown.
pub const GCD_CATEGORY: u32 = 133;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastConfig {
    pub gcd_category: u32,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            gcd_category: GCD_CATEGORY,
        }
    }
}

/// Checks whether `unit` may begin casting `spell` at `now`.
pub fn validate_cast(
    unit: &Unit,
    spell: &Spell,
    now: Timestamp,
    config: &CastConfig,
) -> Result<(), CastError> {
    if let Some(casting) = unit.casting.as_ref().filter(|c| c.ends_at > now) {
        return Err(CastError::PlayerIsCasting {
            casting_spell: casting.spell_id,
            cast_ends_at: casting.ends_at,
        });
    }

    if !spell.is_ready {
        return Err(CastError::SpellOnCooldown {
            spell_id: spell.id(),
            remaining: spell.cooldown_remaining(now),
        });
    }

    if spell.info.has_charges() && spell.charges == 0 {
        return Err(CastError::NoChargesAvailable {
            spell_id: spell.id(),
        });
    }

    if spell.info.triggers_gcd() {
        let gcd_ends_at = unit.spells.category_expiry(config.gcd_category);
        if gcd_ends_at > now {
            return Err(CastError::GcdActive {
                spell_id: spell.id(),
                gcd_ends_at,
            });
        }
    }

    Ok(())
}

/// Applies the effects that happen the moment a cast starts: the global
/// cooldown, a spent charge, the spell's own cooldown and, for spells with a
/// cast time, the casting state.
///
/// Charges and cooldown are committed to the unit's known copy of the spell,
/// using the recovery times of `spell` (which may carry adjusted data).
pub fn begin_cast(
    mut unit: Unit,
    spell: &Spell,
    target: Option<UnitId>,
    now: Timestamp,
    config: &CastConfig,
) -> Unit {
    if spell.info.triggers_gcd() {
        unit.spells.cooldown_categories.insert(
            config.gcd_category,
            now.saturating_add(spell.info.start_recovery_time_ms),
        );
    }

    if let Some(known) = unit.spells.get(spell.id()).cloned() {
        let known = if spell.info.has_charges() {
            known.charges().decrement(1, now)
        } else {
            known
        };
        let known = if spell.info.recovery_time_ms > 0 {
            known.cooldown().trigger(spell.info.recovery_time_ms, now)
        } else {
            known
        };
        unit.spells.insert(known);
    }

    let casting = (spell.info.cast_time_ms > 0).then(|| CastingState {
        spell_id: spell.id(),
        ends_at: now.saturating_add(spell.info.cast_time_ms),
        target,
    });

    unit.with_casting(casting)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::SpellInfo;
    use crate::state::SpellId;

    fn spell(info: SpellInfo) -> Spell {
        Spell::new(Arc::new(info))
    }

    fn caster() -> Unit {
        Unit::new("player", "Mage", 1000).player()
    }

    #[test]
    fn ready_spell_validates() {
        let strike = spell(SpellInfo::new(SpellId(1), "Strike").with_cooldown(1500));
        assert_eq!(validate_cast(&caster(), &strike, 0, &CastConfig::default()), Ok(()));
    }

    #[test]
    fn casting_is_checked_first() {
        let config = CastConfig::default();
        let fireball = spell(SpellInfo::new(SpellId(133), "Fireball").with_cast_time(2500));
        let unit = begin_cast(caster(), &fireball, None, 0, &config);

        // Cooldown would also fail; casting wins.
        let cooling = spell(SpellInfo::new(SpellId(2), "Blast").with_cooldown(5000)).start_cooldown(0);
        assert_eq!(
            validate_cast(&unit, &cooling, 1000, &config),
            Err(CastError::PlayerIsCasting {
                casting_spell: SpellId(133),
                cast_ends_at: 2500,
            })
        );
    }

    #[test]
    fn cooldown_is_checked_before_gcd() {
        let config = CastConfig::default();
        let strike = spell(SpellInfo::new(SpellId(1), "Strike").with_cooldown(1500));
        let unit = begin_cast(caster(), &strike, None, 0, &config);
        let cooling = strike.start_cooldown(0);

        let err = validate_cast(&unit, &cooling, 500, &config).unwrap_err();
        assert_eq!(
            err,
            CastError::SpellOnCooldown {
                spell_id: SpellId(1),
                remaining: 1000,
            }
        );
        assert_eq!(crate::SimError::error_code(&err), "SPELL_ON_COOLDOWN");
    }

    #[test]
    fn empty_charges_fail() {
        let judgment = spell(SpellInfo::new(SpellId(3), "Judgment").with_charges(1, 9000));
        let spent = judgment.charges().decrement(1, 0);
        assert_eq!(
            validate_cast(&caster(), &spent, 0, &CastConfig::default()),
            Err(CastError::NoChargesAvailable { spell_id: SpellId(3) })
        );
    }

    #[test]
    fn gcd_blocks_on_gcd_spells_only() {
        let config = CastConfig::default();
        let first = spell(SpellInfo::new(SpellId(1), "Strike"));
        let unit = begin_cast(caster(), &first, None, 0, &config);
        assert_eq!(unit.spells.category_expiry(GCD_CATEGORY), 1500);
        assert!(unit.casting.is_none());

        let second = spell(SpellInfo::new(SpellId(2), "Slam"));
        assert_eq!(
            validate_cast(&unit, &second, 1000, &config),
            Err(CastError::GcdActive {
                spell_id: SpellId(2),
                gcd_ends_at: 1500,
            })
        );
        assert_eq!(validate_cast(&unit, &second, 1500, &config), Ok(()));

        let free = spell(SpellInfo::new(SpellId(3), "Counterspell").off_gcd());
        assert_eq!(validate_cast(&unit, &free, 1000, &config), Ok(()));
    }

    #[test]
    fn begin_cast_spends_charges_and_starts_cooldown() {
        let config = CastConfig::default();
        let judgment = spell(SpellInfo::new(SpellId(3), "Judgment").with_charges(2, 9000).off_gcd());
        let strike = spell(SpellInfo::new(SpellId(1), "Strike").with_cooldown(1500));
        let unit = caster().with_spell(judgment.clone()).with_spell(strike.clone());

        let unit = begin_cast(unit, &judgment, None, 0, &config);
        let unit = begin_cast(unit, &judgment, None, 0, &config);
        let spent = unit.spell(SpellId(3)).unwrap();
        assert_eq!(spent.charges, 0);
        assert_eq!(
            validate_cast(&unit, spent, 0, &config),
            Err(CastError::NoChargesAvailable { spell_id: SpellId(3) })
        );

        let unit = begin_cast(unit, &strike, None, 0, &config);
        let cooling = unit.spell(SpellId(1)).unwrap();
        assert_eq!(cooling.cooldown_expiry, 1500);
        assert!(!cooling.is_ready);
    }

    #[test]
    fn begin_cast_ignores_unknown_spells() {
        let strike = spell(SpellInfo::new(SpellId(1), "Strike").with_cooldown(1500));
        let unit = begin_cast(caster(), &strike, None, 0, &CastConfig::default());
        assert!(unit.spell(SpellId(1)).is_none());
        assert_eq!(unit.spells.category_expiry(GCD_CATEGORY), 1500);
    }
}
