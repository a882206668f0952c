//! Shared fixtures for runtime integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use combat_core::{
    AuraDataFlat, CombatLogEvent, ItemData, PeriodicType, Power, PowerType, SimulationState,
    Spell, SpellId, SpellInfo, SpellRef, Subevent, Unit, UnitId,
};
use combat_runtime::{InMemoryMetadata, SimContext, Simulation, SimulationConfig};
use tracing_subscriber::EnvFilter;

pub const PLAYER: &str = "player";
pub const ENEMY: &str = "enemy";

/// Instant, 1.5 s cooldown, 100 damage on impact.
pub const STRIKE: SpellId = SpellId(1);
/// 2 s cast, 500 mana, 800 damage after 500 ms of travel.
pub const FIREBALL: SpellId = SpellId(133);
/// Two charges recharging over 9 s, off the global cooldown.
pub const JUDGMENT: SpellId = SpellId(20271);
/// Pandemic damage-over-time: 12 s base, 15.6 s cap, 50 damage every 2 s.
pub const MOONFIRE: SpellId = SpellId(8921);
/// Stacking buff, up to 3 stacks, 20 s.
pub const ARCANE_CHARGE: SpellId = SpellId(36032);
/// 12 s debuff whose duration shrinks with the bearer's haste.
pub const SLOW: SpellId = SpellId(31589);
/// Known to metadata but not in the starting spellbook.
pub const ARCANE_BARRAGE: SpellId = SpellId(44425);

/// Trinket granting Arcane Barrage.
pub const TRINKET: u32 = 50_365;
/// Ring pointing at a spell metadata does not know.
pub const BROKEN_RING: u32 = 50_400;

/// Spells the player starts with.
pub const SPELLBOOK: [SpellId; 4] = [STRIKE, FIREBALL, JUDGMENT, MOONFIRE];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn metadata() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .with_spell(
            SpellInfo::new(STRIKE, "Strike")
                .with_cooldown(1500)
                .with_damage(100, 0),
        )
        .with_spell(
            SpellInfo::new(FIREBALL, "Fireball")
                .with_cast_time(2000)
                .with_cost(PowerType::Mana, 500)
                .with_damage(800, 500),
        )
        .with_spell(
            SpellInfo::new(JUDGMENT, "Judgment")
                .with_charges(2, 9000)
                .off_gcd(),
        )
        .with_spell(SpellInfo::new(MOONFIRE, "Moonfire"))
        .with_spell(SpellInfo::new(ARCANE_BARRAGE, "Arcane Barrage").with_damage(300, 0))
        .with_aura(
            AuraDataFlat::new(MOONFIRE, 12_000)
                .pandemic(15_600)
                .periodic(PeriodicType::Damage, 2000, 50),
        )
        .with_aura(AuraDataFlat::new(ARCANE_CHARGE, 20_000).with_max_stacks(3))
        .with_aura(AuraDataFlat {
            duration_hasted: true,
            ..AuraDataFlat::new(SLOW, 12_000)
        })
        .with_item(ItemData {
            id: TRINKET,
            name: "Dislodged Foreign Object".into(),
            item_level: 264,
            spell_ids: vec![ARCANE_BARRAGE.0],
        })
        .with_item(ItemData {
            id: BROKEN_RING,
            name: "Band of Nothing".into(),
            item_level: 200,
            spell_ids: vec![ARCANE_BARRAGE.0, 99_999],
        })
}

/// Player and enemy with empty spellbooks; see [`learn_spellbook`].
pub fn initial_state() -> SimulationState {
    let player = Unit::new(PLAYER, "Mage", 30_000)
        .player()
        .with_power(PowerType::Mana, Power::full(1000));
    let enemy = Unit::new(ENEMY, "Training Dummy", 10_000);

    SimulationState::new().with_unit(player).with_unit(enemy)
}

pub fn learn_spellbook(ctx: &SimContext) {
    for id in SPELLBOOK {
        ctx.learn_spell(&player(), id).expect("fixture spell should exist");
    }
}

pub fn config() -> SimulationConfig {
    SimulationConfig::default().with_default_target(ENEMY)
}

pub fn simulation() -> Simulation {
    simulation_with(config())
}

pub fn simulation_with(config: SimulationConfig) -> Simulation {
    init_tracing();
    let sim = Simulation::builder()
        .initial_state(initial_state())
        .metadata(metadata())
        .config(config)
        .build();
    learn_spellbook(sim.context());
    sim
}

pub fn context() -> SimContext {
    init_tracing();
    let ctx = SimContext::new(initial_state(), Arc::new(metadata()), config());
    learn_spellbook(&ctx);
    ctx
}

pub fn player() -> UnitId {
    UnitId::from(PLAYER)
}

pub fn enemy() -> UnitId {
    UnitId::from(ENEMY)
}

/// `subevent` from the player onto the enemy, carrying `spell`.
pub fn player_on_enemy(subevent: Subevent, spell: SpellId) -> CombatLogEvent {
    CombatLogEvent::new(0, subevent, player(), "Mage")
        .with_dest(enemy(), "Training Dummy")
        .with_spell(SpellRef::bare(spell))
}

pub fn enemy_health(sim: &Simulation) -> u32 {
    sim.context()
        .state
        .unit(&enemy())
        .expect("enemy should exist")
        .health
        .current
}

pub fn player_spell(sim: &Simulation, spell_id: SpellId) -> Spell {
    sim.context()
        .state
        .get_state()
        .spell(&player(), spell_id)
        .cloned()
        .expect("player spell should exist")
}
