//! Static aura definition and refresh rules.

use crate::state::{SpellId, Timestamp};

/// What a periodic aura does on each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PeriodicType {
    Damage,
    Heal,
    Leech,
    Energize,
    TriggerSpell,
}

/// How reapplying an active aura changes its expiry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RefreshBehavior {
    /// Remaining time carries over into the new duration, up to the cap.
    Pandemic,
    /// The new duration replaces the old one.
    #[default]
    Duration,
}

impl RefreshBehavior {
    /// Periodic auras and auras flagged for pandemic refresh carry remaining time over.
    pub fn from_flags(pandemic_refresh: bool, tick_period_ms: u64) -> Self {
        if pandemic_refresh || tick_period_ms > 0 {
            Self::Pandemic
        } else {
            Self::Duration
        }
    }
}

/// Flat aura record.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct AuraDataFlat {
    pub spell_id: SpellId,
    pub base_duration_ms: u64,
    /// Upper bound for a refreshed duration; 0 means 130% of the base duration.
    pub max_duration_ms: u64,
    pub max_stacks: u32,

    pub periodic_type: Option<PeriodicType>,
    pub tick_period_ms: u64,
    /// Amount applied by each periodic tick.
    pub tick_amount: u64,

    pub refresh_behavior: RefreshBehavior,
    pub duration_hasted: bool,
    pub hasted_ticks: bool,
    pub tick_may_crit: bool,
    pub tick_on_application: bool,
    pub rolling_periodic: bool,
}

impl Default for AuraDataFlat {
    fn default() -> Self {
        Self {
            spell_id: SpellId(0),
            base_duration_ms: 0,
            max_duration_ms: 0,
            max_stacks: 1,
            periodic_type: None,
            tick_period_ms: 0,
            tick_amount: 0,
            refresh_behavior: RefreshBehavior::Duration,
            duration_hasted: false,
            hasted_ticks: false,
            tick_may_crit: false,
            tick_on_application: false,
            rolling_periodic: false,
        }
    }
}

const HASTE_SCALE: u64 = 10_000;

impl AuraDataFlat {
    pub fn new(spell_id: SpellId, base_duration_ms: u64) -> Self {
        Self {
            spell_id,
            base_duration_ms,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn pandemic(mut self, max_duration_ms: u64) -> Self {
        self.refresh_behavior = RefreshBehavior::Pandemic;
        self.max_duration_ms = max_duration_ms;
        self
    }

    #[must_use]
    pub fn periodic(mut self, kind: PeriodicType, tick_period_ms: u64, tick_amount: u64) -> Self {
        self.periodic_type = Some(kind);
        self.tick_period_ms = tick_period_ms;
        self.tick_amount = tick_amount;
        self
    }

    #[must_use]
    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks.max(1);
        self
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic_type.is_some() && self.tick_period_ms > 0
    }

    /// The refresh cap: explicit max duration, or 130% of base.
    pub fn duration_cap_ms(&self) -> u64 {
        if self.max_duration_ms > 0 {
            self.max_duration_ms
        } else {
            self.base_duration_ms.saturating_mul(13) / 10
        }
    }

    /// Refresh cap after haste; scales with the duration for hasted-duration auras.
    pub fn effective_cap(&self, haste_bp: u32) -> u64 {
        if self.duration_hasted {
            scale_by_haste(self.duration_cap_ms(), haste_bp)
        } else {
            self.duration_cap_ms()
        }
    }

    /// Expiry of an aura (re)applied at `now` whose previous expiry was `current_expiry`,
    /// on a unit with `haste_bp` haste.
    ///
    /// Pandemic: `now + min(base + remaining, cap)`. Duration: `now + base`.
    /// Base and cap are the hasted values when the duration scales with haste,
    /// matching [`AuraDataFlat::effective_duration`] on application.
    /// The result never exceeds `now + cap`.
    pub fn refreshed_expiry(
        &self,
        current_expiry: Timestamp,
        now: Timestamp,
        haste_bp: u32,
    ) -> Timestamp {
        let base = self.effective_duration(haste_bp);
        let duration = match self.refresh_behavior {
            RefreshBehavior::Pandemic => {
                let remaining = current_expiry.saturating_sub(now);
                base.saturating_add(remaining)
                    .min(self.effective_cap(haste_bp).max(base))
            }
            RefreshBehavior::Duration => base,
        };
        now.saturating_add(duration)
    }

    /// Tick period after haste, given haste in basis points (2500 = +25%).
    pub fn effective_tick_period(&self, haste_bp: u32) -> u64 {
        if self.hasted_ticks {
            scale_by_haste(self.tick_period_ms, haste_bp)
        } else {
            self.tick_period_ms
        }
    }

    /// Base duration after haste, for auras whose duration scales with haste.
    pub fn effective_duration(&self, haste_bp: u32) -> u64 {
        if self.duration_hasted {
            scale_by_haste(self.base_duration_ms, haste_bp)
        } else {
            self.base_duration_ms
        }
    }

    /// Delay from application to the first tick.
    pub fn first_tick_delay(&self, haste_bp: u32) -> u64 {
        if self.tick_on_application {
            0
        } else {
            self.effective_tick_period(haste_bp)
        }
    }
}

fn scale_by_haste(value: u64, haste_bp: u32) -> u64 {
    value.saturating_mul(HASTE_SCALE) / (HASTE_SCALE + u64::from(haste_bp))
}
