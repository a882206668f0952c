//! Built-in handlers that keep unit state in step with combat events.
//!
//! They run at [`BUILTIN_PRIORITY`], ahead of handlers registered by spec
//! code at the default priority of 0.
mod aura;
mod damage;

use std::sync::Arc;

use combat_core::Subevent;

use super::{CombatEventBus, Filter};

pub const BUILTIN_PRIORITY: i32 = 100;

pub(crate) fn install(bus: &CombatEventBus) {
    bus.on("aura_applied", Subevent::SpellAuraApplied, BUILTIN_PRIORITY, aura::applied);
    bus.on("aura_refresh", Subevent::SpellAuraRefresh, BUILTIN_PRIORITY, aura::refresh);
    bus.on("aura_dose_applied", Subevent::SpellAuraAppliedDose, BUILTIN_PRIORITY, aura::dose_applied);
    bus.on("aura_dose_removed", Subevent::SpellAuraRemovedDose, BUILTIN_PRIORITY, aura::dose_removed);
    bus.on("aura_removed", Subevent::SpellAuraRemoved, BUILTIN_PRIORITY, aura::removed);

    for subevent in [
        Subevent::SpellPeriodicDamage,
        Subevent::SpellPeriodicHeal,
        Subevent::SpellEnergize,
    ] {
        bus.on("periodic_tick", subevent, BUILTIN_PRIORITY, aura::periodic);
    }

    for subevent in [Subevent::SpellDamage, Subevent::SwingDamage] {
        bus.subscribe(
            "damage",
            Filter::new(subevent).with_target(),
            BUILTIN_PRIORITY,
            Arc::new(damage::damage),
        );
    }
    bus.on("heal", Subevent::SpellHeal, BUILTIN_PRIORITY, damage::heal);
    bus.on("energize", Subevent::SpellEnergize, BUILTIN_PRIORITY, damage::energize);
}
