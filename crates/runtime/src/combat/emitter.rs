//! Per-invocation collector for events a handler wants to publish.
use combat_core::{CombatLogEvent, Timestamp};

/// Handlers cannot reach the scheduler. They hand new events to an `Emitter`
/// and the bus inserts them once the handler has returned.
#[derive(Debug)]
pub struct Emitter {
    now: Timestamp,
    immediate: Vec<CombatLogEvent>,
    delayed: Vec<CombatLogEvent>,
}

impl Emitter {
    pub(crate) fn new(now: Timestamp) -> Self {
        Self {
            now,
            immediate: Vec::new(),
            delayed: Vec::new(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Queues `event` behind the events already pending on the bus.
    pub fn emit(&mut self, mut event: CombatLogEvent) {
        event.timestamp = self.now;
        self.immediate.push(event);
    }

    /// Publishes `event` `delay_ms` from now. A zero delay is the same as [`Emitter::emit`].
    pub fn emit_after(&mut self, delay_ms: u64, mut event: CombatLogEvent) {
        if delay_ms == 0 {
            return self.emit(event);
        }
        event.timestamp = self.now.saturating_add(delay_ms);
        self.delayed.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.delayed.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<CombatLogEvent>, Vec<CombatLogEvent>) {
        (self.immediate, self.delayed)
    }
}
