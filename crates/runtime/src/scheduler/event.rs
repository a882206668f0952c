//! Scheduled events and their kinds.
use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use combat_core::{CombatLogEvent, SpellId, Timestamp, UnitId};
use serde::Serialize;

use crate::api::Result;
use crate::cast::SpellCast;
use crate::context::SimContext;

pub type EventFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Deferred action run when an event fires.
pub type EventAction = Box<dyn FnOnce(SimContext) -> EventFuture + Send>;

/// What an event is about. Every kind has a fixed priority except `Custom`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    CooldownReady { unit: UnitId, spell_id: SpellId },
    ChargeReady { unit: UnitId, spell_id: SpellId },
    CastStart(Box<SpellCast>),
    CastComplete(Box<SpellCast>),
    ProjectileImpact(Box<SpellCast>),
    CombatLog(Box<CombatLogEvent>),
    /// A delayed `SPELL_AURA_REMOVED`.
    AuraExpire(Box<CombatLogEvent>),
    PeriodicPower { interval_ms: u64 },
    AplEvaluate,
    Custom { name: String, priority: i32 },
}

impl EventKind {
    /// Higher fires first among events at the same time.
    pub fn priority(&self) -> i32 {
        match self {
            Self::CooldownReady { .. } | Self::ChargeReady { .. } => 70,
            Self::CastStart(_) => 60,
            Self::CastComplete(_) => 55,
            Self::ProjectileImpact(_) => 50,
            Self::CombatLog(_) => 40,
            Self::AuraExpire(_) => 30,
            Self::PeriodicPower { .. } => 20,
            Self::AplEvaluate => 10,
            Self::Custom { priority, .. } => *priority,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// An entry in the event scheduler.
///
/// Ordering is by time ascending, then priority descending, then id ascending.
/// The `Ord` impl is reversed so that `BinaryHeap`, a max-heap, pops the
/// earliest event first.
pub struct ScheduledEvent {
    pub id: String,
    pub time: Timestamp,
    pub priority: i32,
    pub kind: EventKind,
    pub(crate) action: Option<EventAction>,
    pub(crate) seq: u64,
}

impl ScheduledEvent {
    pub fn new(id: impl Into<String>, time: Timestamp, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            time,
            priority: kind.priority(),
            kind,
            action: None,
            seq: 0,
        }
    }

    /// Runs `action` instead of the kind's default behaviour when the event fires.
    #[must_use]
    pub fn with_action<F, Fut>(mut self, action: F) -> Self
    where
        F: FnOnce(SimContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.action = Some(Box::new(move |ctx| Box::pin(action(ctx))));
        self
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn trace(&self) -> EventTrace {
        EventTrace {
            id: self.id.clone(),
            time: self.time,
            priority: self.priority,
            kind: self.kind.clone(),
        }
    }
}

impl fmt::Debug for ScheduledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledEvent")
            .field("id", &self.id)
            .field("time", &self.time)
            .field("priority", &self.priority)
            .field("kind", &self.kind.name())
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| other.id.cmp(&self.id))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Observer view of a scheduled event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventTrace {
    pub id: String,
    pub time: Timestamp,
    pub priority: i32,
    pub kind: EventKind,
}
