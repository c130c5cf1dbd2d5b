use std::time::Duration;

/// Worker configuration loaded from environment variables.
///
/// | Env Var              | Default |
/// |----------------------|---------|
/// | `SWEEP_INTERVAL_SECS`| `60`    |
/// | `SWEEP_MIN_AGE_SECS` | `120`   |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often the pending sweep runs.
    pub sweep_interval: Duration,
    /// Minimum age before a pending prompt counts as orphaned. Must
    /// comfortably exceed normal queue latency or the sweep will race
    /// the original message (harmless, but noisy).
    pub sweep_min_age: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        let sweep_min_age_secs: u64 = std::env::var("SWEEP_MIN_AGE_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("SWEEP_MIN_AGE_SECS must be a valid u64");

        Self {
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            sweep_min_age: Duration::from_secs(sweep_min_age_secs),
        }
    }
}
