//! Driver configuration.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Tick rate used when none is configured.
pub const DEFAULT_TICK_RATE: f64 = 20.0;

/// How fast, and for how long, a [`TickDriver`](crate::TickDriver) runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickConfig {
    /// Ticks per second.
    pub tick_rate_hz: f64,
    /// Stop after this many ticks. `None` runs until stopped.
    pub max_ticks: Option<u64>,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE,
            max_ticks: None,
        }
    }
}

/// Errors from parsing or validating a [`TickConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("tick rate must be a positive, finite number of Hz, got {0}")]
    TickRate(f64),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl TickConfig {
    /// Config running at `tick_rate_hz` until stopped.
    pub fn new(tick_rate_hz: f64) -> Result<Self, ConfigError> {
        if !tick_rate_hz.is_finite() || tick_rate_hz <= 0.0 {
            return Err(ConfigError::TickRate(tick_rate_hz));
        }
        Ok(Self {
            tick_rate_hz,
            max_ticks: None,
        })
    }

    /// Stop after `max_ticks` ticks.
    #[must_use]
    pub const fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Time budget of one tick.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }

    /// Read `TICK_RATE` and `MAX_TICKS` from the environment.
    ///
    /// Missing variables keep their defaults; invalid ones are logged and
    /// ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("TICK_RATE") {
            match parse_tick_rate(&raw) {
                Ok(rate) => config.tick_rate_hz = rate,
                Err(err) => warn!(%err, default = DEFAULT_TICK_RATE, "ignoring TICK_RATE"),
            }
        }

        if let Some(raw) = lookup("MAX_TICKS") {
            match raw.trim().parse::<u64>() {
                Ok(max) => config.max_ticks = Some(max),
                Err(_) => {
                    let err = ConfigError::Invalid {
                        key: "MAX_TICKS",
                        value: raw,
                    };
                    warn!(%err, "ignoring MAX_TICKS");
                }
            }
        }

        config
    }
}

fn parse_tick_rate(raw: &str) -> Result<f64, ConfigError> {
    let rate = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::Invalid {
            key: "TICK_RATE",
            value: raw.to_owned(),
        })?;
    TickConfig::new(rate).map(|config| config.tick_rate_hz)
}
