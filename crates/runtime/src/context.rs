//! Shared handles passed to event actions, modifiers and the rotation.
use std::sync::Arc;

use combat_core::{ItemData, MetadataOracle, SimulationState, Spell, SpellId, Timestamp, UnitId};
use tracing::debug;

use crate::api::{Result, RotationProvider};
use crate::combat::CombatEventBus;
use crate::config::SimulationConfig;
use crate::modifiers::PipelineSet;
use crate::scheduler::EventScheduler;
use crate::store::StateStore;

/// Everything an executing event can reach. Cloning is cheap; all fields are shared.
#[derive(Clone)]
pub struct SimContext {
    pub state: StateStore,
    pub scheduler: EventScheduler,
    pub bus: CombatEventBus,
    pub metadata: Arc<dyn MetadataOracle>,
    pub pipelines: Arc<PipelineSet>,
    pub rotation: Option<Arc<dyn RotationProvider>>,
    pub config: Arc<SimulationConfig>,
}

impl SimContext {
    pub fn new(
        initial: SimulationState,
        metadata: Arc<dyn MetadataOracle>,
        config: SimulationConfig,
    ) -> Self {
        let pipelines = PipelineSet::with_base(config.retry);
        Self {
            state: StateStore::with_capacity(initial, config.snapshot_buffer),
            scheduler: EventScheduler::new(),
            bus: CombatEventBus::with_builtin_handlers(),
            metadata,
            pipelines: Arc::new(pipelines),
            rotation: None,
            config: Arc::new(config),
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> Timestamp {
        self.state.now()
    }

    /// Teaches `unit` the spell `spell_id`, resolved through the metadata
    /// provider. A spell the unit already knows keeps its charges and cooldown.
    pub fn learn_spell(&self, unit: &UnitId, spell_id: SpellId) -> Result<Spell> {
        let info = self.metadata.spell(spell_id)?;
        let state = self.state.try_update_state(|state| {
            state.update_unit(unit, |known| {
                if known.spell(spell_id).is_some() {
                    known
                } else {
                    known.with_spell(Spell::new(info))
                }
            })
        })?;
        Ok(state.spell(unit, spell_id)?.clone())
    }

    /// Equips `item_id` on `unit` and teaches every spell the item grants.
    ///
    /// Every lookup happens before the state changes, so a missing item or
    /// granted spell leaves the unit untouched.
    pub fn equip_item(&self, unit: &UnitId, item_id: u32) -> Result<Arc<ItemData>> {
        let item = self.metadata.item(item_id)?;
        let granted = item
            .spell_ids
            .iter()
            .map(|id| self.metadata.spell(SpellId(*id)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.state.update_unit(unit, |mut equipped| {
            for info in granted {
                if equipped.spell(info.id).is_none() {
                    equipped = equipped.with_spell(Spell::new(info));
                }
            }
            equipped.with_item(Arc::clone(&item))
        })?;

        debug!(
            target: "runtime::oracle",
            unit = %unit,
            item_id,
            granted = item.spell_ids.len(),
            "item equipped"
        );
        Ok(item)
    }
}
