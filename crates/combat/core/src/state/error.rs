//! State lookup errors.

use crate::error::{ErrorSeverity, SimError};
use crate::state::{SpellId, UnitId};

/// Errors raised when a state accessor references something that is not there.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),

    #[error("spell {spell_id} not found on unit {unit_id}")]
    SpellNotFound { unit_id: UnitId, spell_id: SpellId },

    #[error("aura {spell_id} not found on unit {unit_id}")]
    AuraNotFound { unit_id: UnitId, spell_id: SpellId },
}

impl SimError for StateError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnitNotFound(_) => "UNIT_NOT_FOUND",
            Self::SpellNotFound { .. } => "SPELL_NOT_FOUND",
            Self::AuraNotFound { .. } => "AURA_NOT_FOUND",
        }
    }
}
