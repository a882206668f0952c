mod common;

use combat_core::{SpellId, Subevent};
use combat_runtime::Simulation;
use common::{ARCANE_CHARGE, MOONFIRE, SLOW, enemy, enemy_health, player_on_enemy};

fn moonfire(sim: &Simulation) -> Option<combat_core::Aura> {
    sim.context()
        .state
        .get_state()
        .aura(&enemy(), MOONFIRE)
        .ok()
        .cloned()
}

fn apply(sim: &Simulation, spell: SpellId) {
    sim.context()
        .bus
        .emit(player_on_enemy(Subevent::SpellAuraApplied, spell));
}

/// Applied at t=0 and left alone, the aura ticks six times (2 s .. 12 s,
/// the last tick landing on the expiry) and is then removed.
#[tokio::test]
async fn periodic_aura_ticks_until_expiry() {
    let mut sim = common::simulation();
    apply(&sim, MOONFIRE);

    sim.run(0).await.expect("run should succeed");
    let aura = moonfire(&sim).expect("aura should be applied");
    assert_eq!(aura.expires_at, 12_000);
    assert_eq!(aura.caster_unit_id, common::player());

    sim.run(13_000).await.expect("run should succeed");
    assert!(moonfire(&sim).is_none(), "aura should have expired");
    assert_eq!(enemy_health(&sim), 10_000 - 6 * 50);
}

/// Base 12 s, cap 15.6 s, reapplied at t=10000 with 2 s remaining:
/// new expiry = 10000 + min(12000 + 2000, 15600) = 24000, and never past
/// `applied_at + max_duration`.
#[tokio::test]
async fn pandemic_refresh_carries_remaining_time() {
    let mut sim = common::simulation();
    apply(&sim, MOONFIRE);
    sim.run(10_000).await.expect("run should succeed");

    apply(&sim, MOONFIRE);
    sim.run(0).await.expect("run should succeed");

    let aura = moonfire(&sim).expect("aura should still be active");
    assert_eq!(aura.applied_at, 10_000);
    assert_eq!(aura.expires_at, 24_000);
    assert!(aura.expires_at <= aura.applied_at + aura.info.max_duration_ms);

    // The removal scheduled by the first application is now stale.
    sim.run(2_001).await.expect("run should succeed");
    assert!(moonfire(&sim).is_some(), "stale removal must be ignored");

    sim.run(12_000).await.expect("run should succeed");
    assert!(moonfire(&sim).is_none());
    assert_eq!(enemy_health(&sim), 10_000 - 12 * 50);
}

#[tokio::test]
async fn doses_are_capped_and_last_dose_removes_aura() {
    let mut sim = common::simulation();
    apply(&sim, ARCANE_CHARGE);
    sim.context().bus.emit(
        player_on_enemy(Subevent::SpellAuraAppliedDose, ARCANE_CHARGE).with_amount(5),
    );
    sim.run(0).await.expect("run should succeed");

    let stacks = |sim: &Simulation| {
        sim.context()
            .state
            .get_state()
            .aura(&enemy(), ARCANE_CHARGE)
            .map(|aura| aura.stacks)
            .ok()
    };
    assert_eq!(stacks(&sim), Some(3));

    sim.context().bus.emit(
        player_on_enemy(Subevent::SpellAuraRemovedDose, ARCANE_CHARGE).with_amount(3),
    );
    sim.run(0).await.expect("run should succeed");
    assert_eq!(stacks(&sim), None);
}

#[tokio::test]
async fn explicit_removal_clears_aura_and_stops_ticks() {
    let mut sim = common::simulation();
    apply(&sim, MOONFIRE);
    sim.run(3000).await.expect("run should succeed");
    assert_eq!(enemy_health(&sim), 10_000 - 50);

    sim.context()
        .bus
        .emit(player_on_enemy(Subevent::SpellAuraRemoved, MOONFIRE));
    sim.run(10_000).await.expect("run should succeed");

    assert!(moonfire(&sim).is_none());
    assert_eq!(enemy_health(&sim), 10_000 - 50);
}

#[tokio::test]
async fn unknown_aura_fails_the_handler() {
    let mut sim = common::simulation();
    apply(&sim, SpellId(42));

    let summary = sim.run(0).await.expect("failures are tolerated by default");
    assert_eq!(summary.events_failed, 1);
    assert!(moonfire(&sim).is_none());
}

/// With 25% haste a 12 s hasted aura lasts 9.6 s, both when applied and
/// when refreshed.
#[tokio::test]
async fn hasted_duration_survives_refresh() {
    let mut sim = common::simulation();
    sim.context()
        .state
        .update_unit(&enemy(), |unit| unit.with_haste(2_500))
        .expect("enemy exists");
    let slow = |sim: &Simulation| {
        sim.context()
            .state
            .get_state()
            .aura(&enemy(), SLOW)
            .ok()
            .cloned()
    };

    apply(&sim, SLOW);
    sim.run(1_000).await.expect("run should succeed");
    assert_eq!(slow(&sim).expect("applied").expires_at, 9_600);

    apply(&sim, SLOW);
    sim.run(0).await.expect("run should succeed");
    assert_eq!(slow(&sim).expect("refreshed").expires_at, 10_600);

    sim.run(9_599).await.expect("run should succeed");
    assert!(slow(&sim).is_some(), "first removal is stale");
    sim.run(1).await.expect("run should succeed");
    assert!(slow(&sim).is_none());
}
