//! [`MetadataOracle`] backed by in-memory maps, loadable from JSON.
use std::collections::HashMap;
use std::sync::Arc;

use combat_core::{AuraDataFlat, ItemData, MetadataError, MetadataOracle, SpellId, SpellInfo};
use serde::Deserialize;
use tracing::debug;

use crate::api::Result;

#[derive(Clone, Debug, Default)]
pub struct InMemoryMetadata {
    spells: HashMap<SpellId, Arc<SpellInfo>>,
    auras: HashMap<SpellId, Arc<AuraDataFlat>>,
    items: HashMap<u32, Arc<ItemData>>,
}

/// On-disk layout accepted by [`InMemoryMetadata::from_json`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetadataDocument {
    spells: Vec<SpellInfo>,
    auras: Vec<AuraDataFlat>,
    items: Vec<ItemData>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `{"spells": [...], "auras": [...], "items": [...]}`. Missing sections are empty.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: MetadataDocument = serde_json::from_str(json)?;
        let metadata = document
            .spells
            .into_iter()
            .fold(Self::new(), Self::with_spell);
        let metadata = document.auras.into_iter().fold(metadata, Self::with_aura);
        let metadata = document.items.into_iter().fold(metadata, Self::with_item);

        debug!(
            target: "runtime::oracle",
            spells = metadata.spells.len(),
            auras = metadata.auras.len(),
            items = metadata.items.len(),
            "loaded metadata"
        );
        Ok(metadata)
    }

    #[must_use]
    pub fn with_spell(mut self, info: SpellInfo) -> Self {
        self.spells.insert(info.id, Arc::new(info));
        self
    }

    #[must_use]
    pub fn with_aura(mut self, aura: AuraDataFlat) -> Self {
        self.auras.insert(aura.spell_id, Arc::new(aura));
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemData) -> Self {
        self.items.insert(item.id, Arc::new(item));
        self
    }

    pub fn spell_count(&self) -> usize {
        self.spells.len()
    }
}

impl MetadataOracle for InMemoryMetadata {
    fn spell(&self, id: SpellId) -> std::result::Result<Arc<SpellInfo>, MetadataError> {
        self.spells
            .get(&id)
            .cloned()
            .ok_or(MetadataError::SpellInfoNotFound(id))
    }

    fn aura(&self, id: SpellId) -> std::result::Result<Arc<AuraDataFlat>, MetadataError> {
        self.auras
            .get(&id)
            .cloned()
            .ok_or(MetadataError::AuraInfoNotFound(id))
    }

    fn item(&self, id: u32) -> std::result::Result<Arc<ItemData>, MetadataError> {
        self.items
            .get(&id)
            .cloned()
            .ok_or(MetadataError::ItemNotFound(id))
    }
}
