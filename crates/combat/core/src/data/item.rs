//! Static item definition.

/// Item record resolved through [`super::MetadataOracle::item`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ItemData {
    pub id: u32,
    pub name: String,
    pub item_level: u32,
    /// Spells granted while the item is equipped (on-use or proc effects).
    pub spell_ids: Vec<u32>,
}
