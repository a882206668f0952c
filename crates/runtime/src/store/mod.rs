//! Single-owner holder of the current [`SimulationState`] snapshot.
//!
//! Readers get an `Arc` to an immutable snapshot and never block writers for
//! longer than a pointer copy. Writers hand an update function to
//! [`StateStore::update_state`]; updates are serialized so each function sees
//! the result of the previous one.
mod units;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use combat_core::{SimulationState, Timestamp};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct StateStore {
    current: Arc<Mutex<Arc<SimulationState>>>,
    snapshots: broadcast::Sender<Arc<SimulationState>>,
}

impl StateStore {
    pub fn new(initial: SimulationState) -> Self {
        Self::with_capacity(initial, 100)
    }

    /// Creates a store whose snapshot channel buffers `capacity` snapshots per subscriber.
    pub fn with_capacity(initial: SimulationState, capacity: usize) -> Self {
        let (snapshots, _) = broadcast::channel(capacity.max(1));
        Self {
            current: Arc::new(Mutex::new(Arc::new(initial))),
            snapshots,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arc<SimulationState>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current snapshot.
    pub fn get_state(&self) -> Arc<SimulationState> {
        Arc::clone(&self.lock())
    }

    pub fn now(&self) -> Timestamp {
        self.lock().current_time
    }

    /// Installs `f(current)` as the new snapshot and returns it.
    ///
    /// The clock of the installed snapshot never goes below the previous one.
    pub fn update_state<F>(&self, f: F) -> Arc<SimulationState>
    where
        F: FnOnce(SimulationState) -> SimulationState,
    {
        let mut guard = self.lock();
        let previous_time = guard.current_time;
        let next = f(SimulationState::clone(&guard)).advance_to(previous_time);
        *guard = Arc::new(next);
        Arc::clone(&guard)
    }

    /// Like [`StateStore::update_state`], but keeps the current snapshot when `f` fails.
    pub fn try_update_state<F, E>(&self, f: F) -> Result<Arc<SimulationState>, E>
    where
        F: FnOnce(SimulationState) -> Result<SimulationState, E>,
    {
        let mut guard = self.lock();
        let previous_time = guard.current_time;
        let next = f(SimulationState::clone(&guard))?.advance_to(previous_time);
        *guard = Arc::new(next);
        Ok(Arc::clone(&guard))
    }

    /// Moves the clock to `time` if it is ahead of the current one.
    pub fn advance_clock(&self, time: Timestamp) -> Timestamp {
        self.update_state(|state| state.advance_to(time)).current_time
    }

    /// Receiver of snapshots sent by [`StateStore::publish_snapshot`].
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<Arc<SimulationState>> {
        self.snapshots.subscribe()
    }

    /// Broadcasts the current snapshot to snapshot subscribers.
    pub fn publish_snapshot(&self) {
        let snapshot = self.get_state();
        let time = snapshot.current_time;
        if self.snapshots.send(snapshot).is_err() {
            // No subscribers - this is normal, not an error
            tracing::trace!(target: "runtime::sim", time, "no snapshot subscribers");
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(SimulationState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_replace_the_snapshot() {
        let store = StateStore::default();
        let before = store.get_state();
        let after = store.update_state(|state| state.advance_to(250));

        assert_eq!(before.current_time, 0);
        assert_eq!(after.current_time, 250);
        assert_eq!(store.now(), 250);
    }

    #[test]
    fn clock_never_rewinds() {
        let store = StateStore::default();
        store.advance_clock(1000);
        store.update_state(|mut state| {
            state.current_time = 10;
            state
        });
        assert_eq!(store.now(), 1000);
        assert_eq!(store.advance_clock(500), 1000);
    }

    #[test]
    fn failed_update_keeps_state() {
        let store = StateStore::default();
        let result: Result<_, &str> = store.try_update_state(|_| Err("nope"));
        assert!(result.is_err());
        assert_eq!(store.now(), 0);
    }

    #[tokio::test]
    async fn concurrent_updates_serialize() {
        let store = StateStore::default();
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.spawn(async move {
                store.update_state(|state| {
                    let next = state.current_time + 1;
                    state.advance_to(next)
                });
            });
        }
        while tasks.join_next().await.is_some() {}
        assert_eq!(store.now(), 50);
    }

    #[tokio::test]
    async fn snapshots_reach_subscribers() {
        let store = StateStore::default();
        let mut rx = store.subscribe_snapshots();
        store.advance_clock(42);
        store.publish_snapshot();
        assert_eq!(rx.recv().await.unwrap().current_time, 42);
    }
}
