use std::cmp::Reverse;

use combat_core::Timestamp;
use combat_runtime::{EventKind, EventScheduler, ScheduledEvent};

fn custom(id: String, time: Timestamp, priority: i32) -> ScheduledEvent {
    ScheduledEvent::new(
        id.clone(),
        time,
        EventKind::Custom { name: id, priority },
    )
}

/// Small linear congruential generator so the schedule is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

type Entry = (Timestamp, i32, String);

/// Sort key of the scheduler's ordering: time, then higher priority, then id.
fn key(entry: &Entry) -> (Timestamp, Reverse<i32>, &str) {
    (entry.0, Reverse(entry.1), entry.2.as_str())
}

/// Dequeues one event and checks it against the minimum of the pending set.
fn dequeue_checked(scheduler: &EventScheduler, pending: &mut Vec<Entry>, out: &mut Vec<Entry>) {
    let Some(event) = scheduler.dequeue() else {
        assert!(pending.is_empty(), "scheduler lost {pending:?}");
        return;
    };
    let got = (event.time, event.priority, event.id);
    let (min_at, _) = pending
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| key(a).cmp(&key(b)))
        .expect("pending set tracks the scheduler");
    let expected = pending.remove(min_at);
    assert_eq!(got, expected, "dequeue was not the minimum pending event");
    out.push(got);
}

fn replay(seed: u64) -> Vec<Entry> {
    let scheduler = EventScheduler::new();
    let mut rng = Lcg(seed);
    let mut pending = Vec::new();
    let mut out = Vec::new();

    for round in 0..50 {
        for n in 0..4 {
            let time = scheduler.now() + rng.next(40);
            let priority = i32::try_from(rng.next(3)).expect("small") * 10;
            let id = format!("e{:02}-{n}", rng.next(30));
            let id = format!("{id}-{round}");
            scheduler
                .schedule(custom(id.clone(), time, priority))
                .expect("future events are accepted");
            pending.push((time, priority, id));
        }
        for _ in 0..rng.next(5) {
            dequeue_checked(&scheduler, &mut pending, &mut out);
        }
    }
    while !scheduler.is_empty() {
        dequeue_checked(&scheduler, &mut pending, &mut out);
    }
    assert!(pending.is_empty());
    out
}

/// Identical schedule/dequeue sequences yield identical event orders, and
/// every dequeue returns the minimum pending event by (time, priority desc, id).
#[test]
fn interleaved_schedules_are_deterministic() {
    let first = replay(7);
    let second = replay(7);
    assert_eq!(first, second);
    assert_eq!(first.len(), 200);

    for pair in first.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.0 <= b.0, "time went backwards: {a:?} then {b:?}");
    }
}

#[test]
fn ties_break_on_priority_then_id() {
    let scheduler = EventScheduler::new();
    scheduler.schedule(custom("b".into(), 100, 5)).expect("schedule");
    scheduler.schedule(custom("a".into(), 100, 5)).expect("schedule");
    scheduler.schedule(custom("low".into(), 100, 1)).expect("schedule");
    scheduler.schedule(custom("high".into(), 100, 10)).expect("schedule");

    let order: Vec<_> = std::iter::from_fn(|| scheduler.dequeue().map(|e| e.id)).collect();
    assert_eq!(order, vec!["high", "a", "b", "low"]);
    assert!(scheduler.dequeue().is_none(), "no event is dequeued twice");
}

#[test]
fn fixed_kind_priorities() {
    let kinds = [
        (EventKind::AplEvaluate, 10),
        (EventKind::PeriodicPower { interval_ms: 1000 }, 20),
        (
            EventKind::CooldownReady {
                unit: "player".into(),
                spell_id: combat_core::SpellId(1),
            },
            70,
        ),
    ];
    for (kind, priority) in kinds {
        assert_eq!(kind.priority(), priority, "{}", kind.name());
    }
}
