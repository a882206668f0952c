use crate::error::{ErrorSeverity, SimError};
use crate::state::{SpellId, Timestamp};

/// Reasons a cast cannot start.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastError {
    #[error("already casting spell {casting_spell} until {cast_ends_at}ms")]
    PlayerIsCasting {
        casting_spell: SpellId,
        cast_ends_at: Timestamp,
    },

    #[error("spell {spell_id} is on cooldown ({remaining}ms remaining)")]
    SpellOnCooldown { spell_id: SpellId, remaining: u64 },

    #[error("spell {spell_id} has no charges available")]
    NoChargesAvailable { spell_id: SpellId },

    #[error("global cooldown active until {gcd_ends_at}ms (spell {spell_id})")]
    GcdActive {
        spell_id: SpellId,
        gcd_ends_at: Timestamp,
    },

    /// Rejected by a modifier or other game rule.
    #[error("cast of spell {spell_id} rejected: {reason}")]
    Rejected { spell_id: SpellId, reason: String },
}

impl CastError {
    pub fn rejected(spell_id: SpellId, reason: impl Into<String>) -> Self {
        Self::Rejected {
            spell_id,
            reason: reason.into(),
        }
    }
}

impl SimError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Rejected { .. } => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::PlayerIsCasting { .. } => "PLAYER_IS_CASTING",
            Self::SpellOnCooldown { .. } => "SPELL_ON_COOLDOWN",
            Self::NoChargesAvailable { .. } => "NO_CHARGES_AVAILABLE",
            Self::GcdActive { .. } => "GCD_ACTIVE",
            Self::Rejected { .. } => "CAST",
        }
    }
}
