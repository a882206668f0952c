//! Simulation loop: drains the event scheduler up to an end time.
//!
//! Each iteration peeks the earliest event, stops if it lies past the end of
//! the run, otherwise dequeues it, moves the clock to its time, runs it and
//! then delivers whatever it published on the combat bus. Ordering is entirely
//! the scheduler's; the loop never reorders events.
mod dispatch;
mod rotation;

pub use rotation::REJECTED_CAST_BACKOFF_MS;

use std::sync::Arc;

use combat_core::{ItemData, MetadataOracle, SimulationState, Spell, SpellId, Timestamp, UnitId};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::api::{Result, RotationProvider, RuntimeError};
use crate::cast::{self, CastOutcome};
use crate::combat::handlers;
use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::modifiers::PipelineSet;
use crate::oracle::InMemoryMetadata;
use crate::scheduler::{EventKind, EventTrace, ScheduledEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SimStatus {
    Running,
    Halted,
}

/// Result of one [`Simulation::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub final_time: Timestamp,
    /// Events dequeued during the run, failed ones included.
    pub events_processed: u64,
    pub events_failed: u64,
}

pub struct Simulation {
    ctx: SimContext,
    status: SimStatus,
}

impl Simulation {
    pub fn new(
        initial: SimulationState,
        metadata: Arc<dyn MetadataOracle>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            ctx: SimContext::new(initial, metadata, config),
            status: SimStatus::Halted,
        }
    }

    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    /// Replaces the modifier pipelines. Call before the first cast.
    #[must_use]
    pub fn with_pipelines(mut self, pipelines: PipelineSet) -> Self {
        self.ctx.pipelines = Arc::new(pipelines);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: impl RotationProvider + 'static) -> Self {
        self.ctx.rotation = Some(Arc::new(rotation));
        self
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn status(&self) -> SimStatus {
        self.status
    }

    pub fn now(&self) -> Timestamp {
        self.ctx.now()
    }

    /// Casts at the current simulated time. See [`cast::cast`].
    pub async fn cast(
        &self,
        caster: &UnitId,
        spell_id: SpellId,
        target: Option<UnitId>,
    ) -> Result<CastOutcome> {
        cast::cast(&self.ctx, caster, spell_id, target).await
    }

    /// Teaches `unit` a spell from the metadata provider. See [`SimContext::learn_spell`].
    pub fn learn_spell(&self, unit: &UnitId, spell_id: SpellId) -> Result<Spell> {
        self.ctx.learn_spell(unit, spell_id)
    }

    pub fn equip_item(&self, unit: &UnitId, item_id: u32) -> Result<Arc<ItemData>> {
        self.ctx.equip_item(unit, item_id)
    }

    /// Schedules passive power regeneration every `interval_ms`, starting one interval from now.
    pub fn enable_power_regen(&self, interval_ms: u64) -> Result<()> {
        if interval_ms == 0 {
            return Ok(());
        }
        self.ctx.scheduler.schedule(ScheduledEvent::new(
            self.ctx.scheduler.fresh_id("periodic_power"),
            self.ctx.now().saturating_add(interval_ms),
            EventKind::PeriodicPower { interval_ms },
        ))
    }

    /// Processes every event due within `duration_ms` of the current time and
    /// leaves the clock at the end of that window.
    pub async fn run(&mut self, duration_ms: u64) -> Result<RunSummary> {
        let start = self.ctx.now();
        let end = start.saturating_add(duration_ms);
        self.status = SimStatus::Running;

        info!(
            target: "runtime::sim",
            start,
            end,
            pending = self.ctx.scheduler.len(),
            "simulation run started"
        );

        if self.ctx.rotation.is_some() {
            rotation::request_evaluation(&self.ctx, start)?;
        }

        let mut summary = RunSummary::default();
        let mut next_snapshot = self.first_snapshot_boundary(start);

        // Combat events published before the run (setup auras, manual emits).
        if let Err(err) = self.ctx.bus.process_pending(&self.ctx) {
            self.record_failure(None, start, err, &mut summary)?;
        }

        while let Some(next) = self.ctx.scheduler.peek() {
            if next.time > end {
                break;
            }
            let Some(event) = self.ctx.scheduler.dequeue() else {
                break;
            };

            self.publish_snapshots_through(event.time, &mut next_snapshot);
            self.ctx.state.advance_clock(event.time);

            let event_id = event.id.clone();
            let time = event.time;
            summary.events_processed += 1;

            if let Err(err) = self.process(event).await {
                self.record_failure(Some(&event_id), time, err, &mut summary)?;
            }
        }

        // Boundaries in the quiet tail of the window; the halt snapshot covers `end` itself.
        self.publish_snapshots_through(end.saturating_sub(1), &mut next_snapshot);
        self.ctx.state.advance_clock(end);
        self.ctx.scheduler.set_current_time(end);
        if next_snapshot.is_some() {
            self.ctx.state.publish_snapshot();
        }

        self.status = SimStatus::Halted;
        summary.final_time = self.ctx.now();

        info!(
            target: "runtime::sim",
            final_time = summary.final_time,
            processed = summary.events_processed,
            failed = summary.events_failed,
            pending = self.ctx.scheduler.len(),
            "simulation run finished"
        );
        Ok(summary)
    }

    /// Processes the next pending event regardless of its time, or returns
    /// `None` when the queue is empty.
    pub async fn step(&mut self) -> Result<Option<EventTrace>> {
        self.ctx.bus.process_pending(&self.ctx)?;

        let Some(event) = self.ctx.scheduler.dequeue() else {
            return Ok(None);
        };
        self.ctx.state.advance_clock(event.time);

        let trace = event.trace();
        self.process(event).await?;
        Ok(Some(trace))
    }

    /// Drops pending events, queued combat events and registered combat
    /// handlers, then reinstalls the built-in handlers. Units and the clock are kept.
    pub fn reset(&mut self) {
        self.ctx.scheduler.clear();
        self.ctx.bus.clear();
        handlers::install(&self.ctx.bus);
        self.status = SimStatus::Halted;
        debug!(target: "runtime::sim", time = self.ctx.now(), "simulation reset");
    }

    async fn process(&self, event: ScheduledEvent) -> Result<()> {
        trace!(
            target: "runtime::sim",
            event_id = %event.id,
            time = event.time,
            kind = event.kind.name(),
            "executing event"
        );

        let ScheduledEvent { kind, action, .. } = event;
        match action {
            Some(action) => action(self.ctx.clone()).await?,
            None => dispatch::run_default(&self.ctx, kind).await?,
        }
        self.ctx.bus.process_pending(&self.ctx)?;
        Ok(())
    }

    fn record_failure(
        &mut self,
        event_id: Option<&str>,
        at: Timestamp,
        err: RuntimeError,
        summary: &mut RunSummary,
    ) -> Result<()> {
        summary.events_failed += 1;

        if self.ctx.config.halt_on_error {
            self.status = SimStatus::Halted;
            warn!(
                target: "runtime::sim",
                event_id = event_id.unwrap_or("combat_bus"),
                time = at,
                error = %err,
                "simulation halted on failed event"
            );
            return Err(RuntimeError::Halted {
                at,
                source: Box::new(err),
            });
        }

        warn!(
            target: "runtime::sim",
            event_id = event_id.unwrap_or("combat_bus"),
            time = at,
            error = %err,
            "event failed, continuing"
        );
        Ok(())
    }

    fn first_snapshot_boundary(&self, start: Timestamp) -> Option<Timestamp> {
        let interval = self.ctx.config.snapshot_interval_ms.filter(|ms| *ms > 0)?;
        Some((start / interval + 1).saturating_mul(interval))
    }

    /// Publishes one snapshot per interval boundary at or before `time`, with
    /// the clock moved to each boundary first.
    fn publish_snapshots_through(&self, time: Timestamp, next: &mut Option<Timestamp>) {
        let Some(interval) = self.ctx.config.snapshot_interval_ms.filter(|ms| *ms > 0) else {
            return;
        };
        while let Some(boundary) = next.filter(|boundary| *boundary <= time) {
            self.ctx.state.advance_clock(boundary);
            self.ctx.state.publish_snapshot();
            *next = boundary.checked_add(interval);
        }
    }
}

/// Builder for [`Simulation`]. Metadata defaults to an empty in-memory oracle.
#[derive(Default)]
pub struct SimulationBuilder {
    config: Option<SimulationConfig>,
    state: Option<SimulationState>,
    metadata: Option<Arc<dyn MetadataOracle>>,
    pipelines: Option<PipelineSet>,
    rotation: Option<Arc<dyn RotationProvider>>,
}

impl SimulationBuilder {
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn initial_state(mut self, state: SimulationState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn metadata(mut self, metadata: impl MetadataOracle + 'static) -> Self {
        self.metadata = Some(Arc::new(metadata));
        self
    }

    pub fn shared_metadata(mut self, metadata: Arc<dyn MetadataOracle>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Per-spell pipelines. Without this every spell uses the base modifiers
    /// under the configured retry policy.
    pub fn pipelines(mut self, pipelines: PipelineSet) -> Self {
        self.pipelines = Some(pipelines);
        self
    }

    pub fn rotation(mut self, rotation: impl RotationProvider + 'static) -> Self {
        self.rotation = Some(Arc::new(rotation));
        self
    }

    pub fn build(self) -> Simulation {
        let metadata = self
            .metadata
            .unwrap_or_else(|| Arc::new(InMemoryMetadata::new()));
        let mut simulation = Simulation::new(
            self.state.unwrap_or_default(),
            metadata,
            self.config.unwrap_or_default(),
        );
        if let Some(pipelines) = self.pipelines {
            simulation.ctx.pipelines = Arc::new(pipelines);
        }
        simulation.ctx.rotation = self.rotation;
        simulation
    }
}
