//! Time/priority ordered queue of pending events.
//!
//! The scheduler owns its own notion of "now": the time of the last dequeued
//! event, or whatever the simulation loop advanced it to. Scheduling before
//! that point is rejected. Cancellation is lazy: cancelled entries stay in
//! the heap as tombstones and are skipped on the way out, and the heap is
//! compacted once tombstones outnumber half of it.
mod event;

pub use event::{EventAction, EventFuture, EventKind, EventTrace, ScheduledEvent};

use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use combat_core::Timestamp;
use tokio::sync::mpsc;
use tracing::trace;

use crate::api::{Result, RuntimeError};

#[derive(Default)]
struct Queue {
    heap: BinaryHeap<ScheduledEvent>,
    /// Live id -> sequence number of the entry holding it.
    live: HashMap<String, u64>,
    tombstones: HashSet<u64>,
    now: Timestamp,
    next_seq: u64,
    next_id: u64,
    observers: Vec<mpsc::UnboundedSender<EventTrace>>,
}

impl Queue {
    fn discard_tombstones(&mut self) {
        while let Some(top) = self.heap.peek() {
            if !self.tombstones.remove(&top.seq) {
                break;
            }
            self.heap.pop();
        }
    }

    fn compact(&mut self) {
        let tombstones = std::mem::take(&mut self.tombstones);
        self.heap.retain(|event| !tombstones.contains(&event.seq));
    }
}

#[derive(Clone, Default)]
pub struct EventScheduler {
    queue: Arc<Mutex<Queue>>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts an event and publishes its trace to observers.
    pub fn schedule(&self, mut event: ScheduledEvent) -> Result<()> {
        let mut queue = self.lock();

        if event.time < queue.now {
            return Err(RuntimeError::ScheduleInPast {
                event_id: event.id,
                current_time: queue.now,
                event_time: event.time,
            });
        }
        if queue.live.contains_key(&event.id) {
            return Err(RuntimeError::DuplicateEvent(event.id));
        }

        event.seq = queue.next_seq;
        queue.next_seq += 1;
        queue.live.insert(event.id.clone(), event.seq);

        let trace = event.trace();
        trace!(
            target: "runtime::scheduler",
            event_id = %trace.id,
            time = trace.time,
            priority = trace.priority,
            kind = trace.kind.name(),
            "event scheduled"
        );
        queue.heap.push(event);
        queue
            .observers
            .retain(|observer| observer.send(trace.clone()).is_ok());
        Ok(())
    }

    /// Like [`EventScheduler::schedule`], but a live event already holding the id
    /// is left in place. Returns whether `event` was inserted.
    pub fn schedule_once(&self, event: ScheduledEvent) -> Result<bool> {
        match self.schedule(event) {
            Ok(()) => Ok(true),
            Err(RuntimeError::DuplicateEvent(id)) => {
                trace!(target: "runtime::scheduler", event_id = %id, "already scheduled");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// True while a live event holds `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().live.contains_key(id)
    }

    /// Removes and returns the earliest live event, advancing "now" to its time.
    pub fn dequeue(&self) -> Option<ScheduledEvent> {
        let mut queue = self.lock();
        queue.discard_tombstones();
        let event = queue.heap.pop()?;
        queue.live.remove(&event.id);
        queue.now = queue.now.max(event.time);
        Some(event)
    }

    /// The earliest live event, without removing it.
    pub fn peek(&self) -> Option<EventTrace> {
        let mut queue = self.lock();
        queue.discard_tombstones();
        queue.heap.peek().map(ScheduledEvent::trace)
    }

    /// Cancels a pending event. Returns false when no live event has that id.
    pub fn cancel(&self, id: &str) -> bool {
        let mut queue = self.lock();
        let Some(seq) = queue.live.remove(id) else {
            return false;
        };
        queue.tombstones.insert(seq);
        if queue.tombstones.len() * 2 > queue.heap.len() {
            queue.compact();
        }
        trace!(target: "runtime::scheduler", event_id = id, "event cancelled");
        true
    }

    /// Cancels every pending event matching `predicate`, returning how many were removed.
    pub fn cancel_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&ScheduledEvent) -> bool,
    {
        let mut queue = self.lock();
        queue.compact();

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut queue.heap)
            .into_vec()
            .into_iter()
            .partition(|event| predicate(event));
        for event in &removed {
            queue.live.remove(&event.id);
        }
        queue.heap = BinaryHeap::from(kept);
        removed.len()
    }

    /// Earliest time among pending events matching `predicate`.
    pub fn earliest_where<P>(&self, predicate: P) -> Option<Timestamp>
    where
        P: Fn(&ScheduledEvent) -> bool,
    {
        let queue = self.lock();
        queue
            .heap
            .iter()
            .filter(|event| !queue.tombstones.contains(&event.seq))
            .filter(|event| predicate(event))
            .map(|event| event.time)
            .min()
    }

    /// Drops every pending event. The clock is kept.
    pub fn clear(&self) {
        let mut queue = self.lock();
        queue.heap.clear();
        queue.live.clear();
        queue.tombstones.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn now(&self) -> Timestamp {
        self.lock().now
    }

    /// Moves "now" forward; earlier times are ignored.
    pub fn set_current_time(&self, time: Timestamp) {
        let mut queue = self.lock();
        queue.now = queue.now.max(time);
    }

    /// A unique id that sorts after every id previously produced for the same prefix.
    pub fn fresh_id(&self, prefix: &str) -> String {
        let mut queue = self.lock();
        let seq = queue.next_id;
        queue.next_id += 1;
        format!("{prefix}#{seq:010}")
    }

    /// Stream of every event as it is scheduled.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<EventTrace> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().observers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(id: &str, time: Timestamp, priority: i32) -> ScheduledEvent {
        ScheduledEvent::new(
            id,
            time,
            EventKind::Custom {
                name: id.into(),
                priority,
            },
        )
    }

    fn drain(scheduler: &EventScheduler) -> Vec<String> {
        std::iter::from_fn(|| scheduler.dequeue().map(|event| event.id)).collect()
    }

    #[test]
    fn orders_by_time_priority_then_id() {
        let scheduler = EventScheduler::new();
        scheduler.schedule(custom("late", 200, 100)).unwrap();
        scheduler.schedule(custom("b", 100, 5)).unwrap();
        scheduler.schedule(custom("a", 100, 5)).unwrap();
        scheduler.schedule(custom("high", 100, 10)).unwrap();
        scheduler.schedule(custom("low", 100, 1)).unwrap();

        assert_eq!(drain(&scheduler), ["high", "a", "b", "low", "late"]);
    }

    #[test]
    fn rejects_past_and_duplicates() {
        let scheduler = EventScheduler::new();
        scheduler.schedule(custom("a", 100, 0)).unwrap();
        assert!(matches!(
            scheduler.schedule(custom("a", 150, 0)),
            Err(RuntimeError::DuplicateEvent(id)) if id == "a"
        ));

        scheduler.dequeue().unwrap();
        assert_eq!(scheduler.now(), 100);
        assert!(matches!(
            scheduler.schedule(custom("b", 99, 0)),
            Err(RuntimeError::ScheduleInPast { current_time: 100, event_time: 99, .. })
        ));
        // Same instant is fine; the id is free again once dequeued.
        scheduler.schedule(custom("a", 100, 0)).unwrap();
    }

    #[test]
    fn schedule_once_keeps_the_live_event() {
        let scheduler = EventScheduler::new();
        assert!(scheduler.schedule_once(custom("impact", 100, 0)).unwrap());
        assert!(!scheduler.schedule_once(custom("impact", 300, 0)).unwrap());
        assert!(scheduler.contains("impact"));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.peek().unwrap().time, 100);

        scheduler.dequeue().unwrap();
        assert!(!scheduler.contains("impact"));
        assert!(matches!(
            scheduler.schedule_once(custom("late", 50, 0)),
            Err(RuntimeError::ScheduleInPast { .. })
        ));
    }

    #[test]
    fn cancelled_events_are_skipped() {
        let scheduler = EventScheduler::new();
        for (id, time) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
            scheduler.schedule(custom(id, time, 0)).unwrap();
        }
        assert!(scheduler.cancel("a"));
        assert!(!scheduler.cancel("a"));
        assert_eq!(scheduler.len(), 3);
        assert_eq!(scheduler.peek().unwrap().id, "b");

        // Reusing a cancelled id schedules a fresh entry.
        scheduler.schedule(custom("a", 50, 0)).unwrap();
        assert_eq!(drain(&scheduler), ["b", "c", "d", "a"]);
    }

    #[test]
    fn cancel_where_rebuilds_queue() {
        let scheduler = EventScheduler::new();
        scheduler.schedule(custom("keep", 10, 0)).unwrap();
        scheduler.schedule(ScheduledEvent::new("apl", 5, EventKind::AplEvaluate)).unwrap();
        scheduler.schedule(ScheduledEvent::new("apl2", 15, EventKind::AplEvaluate)).unwrap();

        assert_eq!(
            scheduler.earliest_where(|event| event.kind == EventKind::AplEvaluate),
            Some(5)
        );
        assert_eq!(scheduler.cancel_where(|event| event.kind == EventKind::AplEvaluate), 2);
        assert_eq!(drain(&scheduler), ["keep"]);
    }

    #[test]
    fn fresh_ids_sort_in_creation_order() {
        let scheduler = EventScheduler::new();
        let first = scheduler.fresh_id("tick");
        let second = scheduler.fresh_id("tick");
        assert_eq!(first, "tick#0000000000");
        assert!(first < second);
    }

    #[tokio::test]
    async fn observers_see_every_schedule() {
        let scheduler = EventScheduler::new();
        let mut rx = scheduler.subscribe();
        scheduler.schedule(custom("a", 1, 0)).unwrap();
        scheduler.schedule(custom("b", 2, 0)).unwrap();
        assert_eq!(rx.recv().await.unwrap().id, "a");
        assert_eq!(rx.recv().await.unwrap().id, "b");

        drop(rx);
        // A dropped observer is pruned, not an error.
        scheduler.schedule(custom("c", 3, 0)).unwrap();
    }
}
