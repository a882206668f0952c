//! Combat event bus: a FIFO of combat-log events plus the handlers that react to them.
//!
//! Events are published with [`CombatEventBus::emit`] and delivered when the
//! simulation loop calls [`CombatEventBus::process_pending`]. Each handler
//! receives an [`Emitter`]; what it emits is inserted after it returns, either
//! at the back of the FIFO or, when delayed, as an event on the scheduler.
mod emitter;
pub mod handlers;
mod registry;

pub use emitter::Emitter;
pub use registry::{CombatHandler, Filter, HandlerContext, HandlerId, HandlerRegistry};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use combat_core::{CombatLogEvent, SpellId, Subevent};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::api::{Result, RuntimeError};
use crate::context::SimContext;
use crate::scheduler::{EventKind, ScheduledEvent};

#[derive(Default)]
struct BusState {
    queue: VecDeque<CombatLogEvent>,
    registry: HandlerRegistry,
    observers: Vec<mpsc::UnboundedSender<CombatLogEvent>>,
}

#[derive(Clone, Default)]
pub struct CombatEventBus {
    state: Arc<Mutex<BusState>>,
}

impl CombatEventBus {
    /// A bus with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus with the built-in state handlers (auras, damage, healing, resources).
    pub fn with_builtin_handlers() -> Self {
        let bus = Self::new();
        handlers::install(&bus);
        bus
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn emit(&self, event: CombatLogEvent) {
        trace!(
            target: "runtime::bus",
            subevent = %event.subevent,
            time = event.timestamp,
            "combat event queued"
        );
        self.lock().queue.push_back(event);
    }

    /// Queues several events in timestamp order.
    pub fn emit_batch(&self, events: impl IntoIterator<Item = CombatLogEvent>) {
        let mut events: Vec<_> = events.into_iter().collect();
        events.sort_by_key(|event| event.timestamp);
        self.lock().queue.extend(events);
    }

    /// Registers `handler` for every event with the given subevent.
    pub fn on<F>(&self, name: &str, subevent: Subevent, priority: i32, handler: F) -> HandlerId
    where
        F: Fn(&CombatLogEvent, &HandlerContext<'_>, &mut Emitter) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.subscribe(name, Filter::new(subevent), priority, Arc::new(handler))
    }

    /// Registers `handler` for one subevent of one spell.
    pub fn on_spell<F>(
        &self,
        name: &str,
        subevent: Subevent,
        spell_id: SpellId,
        priority: i32,
        handler: F,
    ) -> HandlerId
    where
        F: Fn(&CombatLogEvent, &HandlerContext<'_>, &mut Emitter) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.subscribe(
            name,
            Filter::new(subevent).spell(spell_id),
            priority,
            Arc::new(handler),
        )
    }

    pub fn subscribe(
        &self,
        name: &str,
        filter: Filter,
        priority: i32,
        handler: Arc<dyn CombatHandler>,
    ) -> HandlerId {
        self.lock().registry.register(name, filter, priority, handler)
    }

    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.lock().registry.unregister(id)
    }

    /// Removes every handler and drops queued events.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.registry.clear();
        state.queue.clear();
    }

    pub fn handler_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Receives every event as it is processed.
    pub fn observe(&self) -> mpsc::UnboundedReceiver<CombatLogEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().observers.push(tx);
        rx
    }

    /// Delivers queued events until the FIFO is empty, returning how many were processed.
    ///
    /// A failing handler stops processing; its emissions are discarded and the
    /// error names the handler and subevent. Events still queued stay queued.
    pub fn process_pending(&self, ctx: &SimContext) -> Result<usize> {
        let mut processed = 0;

        loop {
            let (event, handlers) = {
                let mut state = self.lock();
                let Some(event) = state.queue.pop_front() else {
                    break;
                };
                state
                    .observers
                    .retain(|observer| observer.send(event.clone()).is_ok());
                let handlers = state.registry.matching(&event);
                (event, handlers)
            };
            processed += 1;

            let handler_ctx = HandlerContext {
                state: &ctx.state,
                metadata: ctx.metadata.as_ref(),
                now: ctx.state.now(),
            };
            trace!(
                target: "runtime::bus",
                subevent = %event.subevent,
                handlers = handlers.len(),
                "dispatching combat event"
            );

            for entry in handlers {
                let mut emitter = Emitter::new(handler_ctx.now);
                if let Err(source) = entry.handler.handle(&event, &handler_ctx, &mut emitter) {
                    warn!(
                        target: "runtime::bus",
                        handler = %entry.name,
                        subevent = %event.subevent,
                        error = %source,
                        "combat handler failed"
                    );
                    return Err(RuntimeError::Handler {
                        handler: entry.name,
                        subevent: event.subevent,
                        source: Box::new(source),
                    });
                }
                self.insert(ctx, emitter)?;
            }
        }

        Ok(processed)
    }

    fn insert(&self, ctx: &SimContext, emitter: Emitter) -> Result<()> {
        let (immediate, delayed) = emitter.into_parts();
        if !immediate.is_empty() {
            self.lock().queue.extend(immediate);
        }

        for event in delayed {
            let time = event.timestamp;
            let (prefix, kind) = if event.subevent == Subevent::SpellAuraRemoved {
                ("aura_expire", EventKind::AuraExpire(Box::new(event)))
            } else {
                ("combat_log", EventKind::CombatLog(Box::new(event)))
            };
            let id = ctx.scheduler.fresh_id(prefix);
            ctx.scheduler.schedule(ScheduledEvent::new(id, time, kind))?;
        }
        Ok(())
    }
}
