//! Registry of combat-event handlers.

use std::sync::Arc;

use combat_core::{CombatLogEvent, MetadataOracle, SpellId, Subevent, Timestamp};

use crate::api::Result;
use crate::store::StateStore;

use super::Emitter;

/// What a handler may touch while reacting to an event.
pub struct HandlerContext<'a> {
    pub state: &'a StateStore,
    pub metadata: &'a dyn MetadataOracle,
    pub now: Timestamp,
}

/// Reacts to a combat event. Closures with the same signature implement this.
pub trait CombatHandler: Send + Sync {
    fn handle(
        &self,
        event: &CombatLogEvent,
        ctx: &HandlerContext<'_>,
        emitter: &mut Emitter,
    ) -> Result<()>;
}

impl<F> CombatHandler for F
where
    F: Fn(&CombatLogEvent, &HandlerContext<'_>, &mut Emitter) -> Result<()> + Send + Sync,
{
    fn handle(
        &self,
        event: &CombatLogEvent,
        ctx: &HandlerContext<'_>,
        emitter: &mut Emitter,
    ) -> Result<()> {
        self(event, ctx, emitter)
    }
}

/// Which events a handler receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub subevent: Subevent,
    pub spell_id: Option<SpellId>,
    /// Skip events without destination fields instead of calling the handler.
    pub requires_target: bool,
}

impl Filter {
    pub fn new(subevent: Subevent) -> Self {
        Self {
            subevent,
            spell_id: None,
            requires_target: false,
        }
    }

    #[must_use]
    pub fn spell(mut self, spell_id: SpellId) -> Self {
        self.spell_id = Some(spell_id);
        self
    }

    #[must_use]
    pub fn with_target(mut self) -> Self {
        self.requires_target = true;
        self
    }

    fn selects(&self, event: &CombatLogEvent) -> bool {
        event.subevent == self.subevent
            && self
                .spell_id
                .is_none_or(|spell_id| event.spell_id() == Some(spell_id))
    }
}

/// Handle returned by a subscription, used to revoke it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(pub u64);

#[derive(Clone)]
pub(crate) struct Registration {
    pub id: HandlerId,
    pub name: String,
    pub filter: Filter,
    pub priority: i32,
    pub handler: Arc<dyn CombatHandler>,
}

/// Handlers sorted by priority (higher first), then registration order.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    entries: Vec<Registration>,
    next_id: u64,
}

impl HandlerRegistry {
    pub fn register(
        &mut self,
        name: impl Into<String>,
        filter: Filter,
        priority: i32,
        handler: Arc<dyn CombatHandler>,
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Registration {
            id,
            name: name.into(),
            filter,
            priority,
            handler,
        });
        self.entries
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        id
    }

    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handlers whose filter selects `event`, in call order. Target-guarded
    /// handlers are dropped when the event has no destination.
    pub(crate) fn matching(&self, event: &CombatLogEvent) -> Vec<Registration> {
        self.entries
            .iter()
            .filter(|entry| entry.filter.selects(event))
            .filter(|entry| {
                let skip = entry.filter.requires_target && !event.has_target();
                if skip {
                    tracing::trace!(
                        target: "runtime::bus",
                        handler = %entry.name,
                        subevent = %event.subevent,
                        "event has no target, handler skipped"
                    );
                }
                !skip
            })
            .cloned()
            .collect()
    }

    /// Registered handler names in call order (for debugging).
    pub fn names(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.priority))
    }
}
