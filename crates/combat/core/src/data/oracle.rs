//! Read-only access to static data.

use std::sync::Arc;

use crate::error::{ErrorSeverity, SimError};
use crate::state::SpellId;

use super::{AuraDataFlat, ItemData, SpellInfo};

/// Lookup misses from a [`MetadataOracle`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("spell info {0} not found")]
    SpellInfoNotFound(SpellId),

    #[error("aura info {0} not found")]
    AuraInfoNotFound(SpellId),

    #[error("item {0} not found")]
    ItemNotFound(u32),
}

impl SimError for MetadataError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SpellInfoNotFound(_) => "SPELL_INFO_NOT_FOUND",
            Self::AuraInfoNotFound(_) => "AURA_INFO_NOT_FOUND",
            Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
        }
    }
}

/// Provider of static spell, aura and item data.
///
/// Implementations are immutable for the lifetime of a simulation and may be
/// shared across tasks.
pub trait MetadataOracle: Send + Sync {
    fn spell(&self, id: SpellId) -> Result<Arc<SpellInfo>, MetadataError>;

    fn aura(&self, id: SpellId) -> Result<Arc<AuraDataFlat>, MetadataError>;

    fn item(&self, id: u32) -> Result<Arc<ItemData>, MetadataError>;
}
