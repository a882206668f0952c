//! Simulation configuration and environment loaders.

use std::env;
use std::time::Duration;

use combat_core::{CastConfig, UnitId, cast::GCD_CATEGORY};

/// Timeout and retry policy applied to every modifier invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on a single modifier call.
    pub timeout: Duration,
    /// Attempts per call, counting the first one. Only timeouts are retried.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            base_delay: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying after the zero-based `attempt`: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(20))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }
}

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Cooldown category holding the global cooldown.
    pub gcd_category: u32,
    /// Publish a state snapshot every time simulated time crosses a multiple of this.
    pub snapshot_interval_ms: Option<u64>,
    /// Stop a run on the first failed event instead of logging and continuing.
    pub halt_on_error: bool,
    /// Target used when a cast does not name one.
    pub default_target: Option<UnitId>,
    /// Capacity of the snapshot broadcast channel.
    pub snapshot_buffer: usize,
    pub retry: RetryPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gcd_category: GCD_CATEGORY,
            snapshot_interval_ms: None,
            halt_on_error: false,
            default_target: None,
            snapshot_buffer: 100,
            retry: RetryPolicy::default(),
        }
    }
}

impl SimulationConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIM_GCD_CATEGORY` - Cooldown category of the GCD (default: 133)
    /// - `SIM_SNAPSHOT_INTERVAL_MS` - Snapshot cadence; unset or 0 disables snapshots
    /// - `SIM_HALT_ON_ERROR` - Abort runs on the first failed event (default: false)
    /// - `SIM_DEFAULT_TARGET` - Unit id used for untargeted casts
    /// - `SIM_SNAPSHOT_BUFFER` - Snapshot channel capacity (default: 100)
    /// - `SIM_MODIFIER_TIMEOUT_MS` - Per-call modifier timeout (default: 10000)
    /// - `SIM_MODIFIER_MAX_ATTEMPTS` - Attempts per modifier call (default: 2)
    /// - `SIM_MODIFIER_RETRY_DELAY_MS` - Base retry backoff (default: 25)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(category) = read_env::<u32>("SIM_GCD_CATEGORY") {
            config.gcd_category = category;
        }
        if let Some(interval) = read_env::<u64>("SIM_SNAPSHOT_INTERVAL_MS") {
            config.snapshot_interval_ms = (interval > 0).then_some(interval);
        }
        if let Some(halt) = read_env_bool("SIM_HALT_ON_ERROR") {
            config.halt_on_error = halt;
        }
        if let Ok(target) = env::var("SIM_DEFAULT_TARGET")
            && !target.is_empty()
        {
            config.default_target = Some(UnitId::new(target));
        }
        if let Some(capacity) = read_env::<usize>("SIM_SNAPSHOT_BUFFER") {
            config.snapshot_buffer = capacity.max(1);
        }

        if let Some(ms) = read_env::<u64>("SIM_MODIFIER_TIMEOUT_MS") {
            config.retry.timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(attempts) = read_env::<u32>("SIM_MODIFIER_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(ms) = read_env::<u64>("SIM_MODIFIER_RETRY_DELAY_MS") {
            config.retry.base_delay = Duration::from_millis(ms);
        }

        config
    }

    pub fn cast_config(&self) -> CastConfig {
        CastConfig {
            gcd_category: self.gcd_category,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_default_target(mut self, target: impl Into<UnitId>) -> Self {
        self.default_target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_snapshot_interval(mut self, interval_ms: u64) -> Self {
        self.snapshot_interval_ms = (interval_ms > 0).then_some(interval_ms);
        self
    }

    #[must_use]
    pub fn halt_on_error(mut self, halt: bool) -> Self {
        self.halt_on_error = halt;
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
