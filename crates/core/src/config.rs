//! Guard configuration: defaults, per-call overrides and env loading.
//!
//! A [`TimebombConfig`] is the full set of options a check runs with. Hosts
//! build one at startup (usually via [`TimebombConfig::from_env`]) and hand
//! it to a [`Timebomb`](crate::Timebomb). Individual calls pass a
//! [`ConfigOverrides`] whose `Some` fields win over the defaults.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::environment;
use crate::error::TimebombError;
use crate::types::MILLIS_PER_DAY;

/// Warning sink: receives a human-readable message.
pub type WarnFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Failure reporter: receives the expiry message. Returning `Err` fails the
/// check; returning `Ok` lets it complete.
pub type FailFn = Arc<dyn Fn(&str) -> Result<(), TimebombError> + Send + Sync>;

/// Production detector.
pub type ProdDetectFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Default length of the warning window, in days.
pub const DEFAULT_WARNING_PERIOD_DAYS: f64 = 7.0;

/// Env var overriding [`GuardSettings::warning_period_days`].
pub const ENV_WARNING_PERIOD_DAYS: &str = "TIMEBOMB_WARNING_PERIOD_DAYS";

/// Env var overriding [`GuardSettings::disable_in_prod`].
pub const ENV_DISABLE_IN_PROD: &str = "TIMEBOMB_DISABLE_IN_PROD";

/// `tracing` target of the default warning sink.
pub const LOG_TARGET: &str = "timebomb";

// ---------------------------------------------------------------------------
// Plain settings
// ---------------------------------------------------------------------------

/// The data-only part of the configuration, suitable for a host's own
/// config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSettings {
    /// Lead time before the deadline during which warnings are emitted.
    pub warning_period_days: f64,
    /// Skip every check when the production detector says so.
    pub disable_in_prod: bool,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            warning_period_days: DEFAULT_WARNING_PERIOD_DAYS,
            disable_in_prod: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Full configuration
// ---------------------------------------------------------------------------

/// Everything a check needs: settings plus the capabilities it calls out to.
#[derive(Clone)]
pub struct TimebombConfig {
    pub warning_period_days: f64,
    pub warn: WarnFn,
    pub fail: FailFn,
    pub disable_in_prod: bool,
    pub prod_detect: ProdDetectFn,
    pub clock: Arc<dyn Clock>,
}

impl Default for TimebombConfig {
    fn default() -> Self {
        Self::from_settings(GuardSettings::default())
    }
}

impl fmt::Debug for TimebombConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimebombConfig")
            .field("warning_period_days", &self.warning_period_days)
            .field("disable_in_prod", &self.disable_in_prod)
            .finish_non_exhaustive()
    }
}

impl TimebombConfig {
    /// Default capabilities with the given settings.
    pub fn from_settings(settings: GuardSettings) -> Self {
        Self {
            warning_period_days: settings.warning_period_days,
            warn: Arc::new(log_warning),
            fail: Arc::new(raise_deadline_exceeded),
            disable_in_prod: settings.disable_in_prod,
            prod_detect: Arc::new(environment::is_production),
            clock: Arc::new(SystemClock),
        }
    }

    /// Load settings from environment variables, with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `TIMEBOMB_WARNING_PERIOD_DAYS` | `7`     |
    /// | `TIMEBOMB_DISABLE_IN_PROD`     | `false` |
    pub fn from_env() -> Result<Self, TimebombError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TimebombError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = GuardSettings::default();

        if let Some(raw) = lookup(ENV_WARNING_PERIOD_DAYS) {
            settings.warning_period_days = parse_days(&raw).ok_or(TimebombError::InvalidConfig {
                var: ENV_WARNING_PERIOD_DAYS,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(ENV_DISABLE_IN_PROD) {
            settings.disable_in_prod = parse_flag(&raw).ok_or(TimebombError::InvalidConfig {
                var: ENV_DISABLE_IN_PROD,
                value: raw.clone(),
            })?;
        }

        Ok(Self::from_settings(settings))
    }

    /// The data-only part of this configuration.
    pub fn settings(&self) -> GuardSettings {
        GuardSettings {
            warning_period_days: self.warning_period_days,
            disable_in_prod: self.disable_in_prod,
        }
    }

    /// A copy of this configuration with every `Some` field of `overrides`
    /// applied.
    pub fn merged(&self, overrides: &ConfigOverrides) -> Self {
        let mut config = self.clone();
        config.update(overrides);
        config
    }

    /// Apply every `Some` field of `overrides` in place.
    pub fn update(&mut self, overrides: &ConfigOverrides) {
        if let Some(days) = overrides.warning_period_days {
            self.warning_period_days = days;
        }
        if let Some(warn) = &overrides.warn {
            self.warn = Arc::clone(warn);
        }
        if let Some(fail) = &overrides.fail {
            self.fail = Arc::clone(fail);
        }
        if let Some(disable) = overrides.disable_in_prod {
            self.disable_in_prod = disable;
        }
        if let Some(detect) = &overrides.prod_detect {
            self.prod_detect = Arc::clone(detect);
        }
        if let Some(clock) = &overrides.clock {
            self.clock = Arc::clone(clock);
        }
    }

    /// Whether checks should be skipped entirely right now.
    pub fn is_disabled(&self) -> bool {
        self.disable_in_prod && (self.prod_detect)()
    }

    /// Length of the warning window in milliseconds.
    pub fn warning_window_ms(&self) -> f64 {
        self.warning_period_days * MILLIS_PER_DAY as f64
    }
}

// ---------------------------------------------------------------------------
// Per-call overrides
// ---------------------------------------------------------------------------

/// A partial configuration. `None` fields fall back to the defaults.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub warning_period_days: Option<f64>,
    pub warn: Option<WarnFn>,
    pub fail: Option<FailFn>,
    pub disable_in_prod: Option<bool>,
    pub prod_detect: Option<ProdDetectFn>,
    pub clock: Option<Arc<dyn Clock>>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning_period_days(mut self, days: f64) -> Self {
        self.warning_period_days = Some(days);
        self
    }

    pub fn warn_with<F>(mut self, warn: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.warn = Some(Arc::new(warn));
        self
    }

    pub fn fail_with<F>(mut self, fail: F) -> Self
    where
        F: Fn(&str) -> Result<(), TimebombError> + Send + Sync + 'static,
    {
        self.fail = Some(Arc::new(fail));
        self
    }

    pub fn disable_in_prod(mut self, disable: bool) -> Self {
        self.disable_in_prod = Some(disable);
        self
    }

    pub fn prod_detect_with<F>(mut self, detect: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.prod_detect = Some(Arc::new(detect));
        self
    }

    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }
}

impl From<GuardSettings> for ConfigOverrides {
    fn from(settings: GuardSettings) -> Self {
        Self {
            warning_period_days: Some(settings.warning_period_days),
            disable_in_prod: Some(settings.disable_in_prod),
            ..Self::default()
        }
    }
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("warning_period_days", &self.warning_period_days)
            .field("warn", &self.warn.is_some())
            .field("fail", &self.fail.is_some())
            .field("disable_in_prod", &self.disable_in_prod)
            .field("prod_detect", &self.prod_detect.is_some())
            .field("clock", &self.clock.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Default capabilities
// ---------------------------------------------------------------------------

fn log_warning(message: &str) {
    tracing::warn!(target: LOG_TARGET, "{message}");
}

fn raise_deadline_exceeded(message: &str) -> Result<(), TimebombError> {
    Err(TimebombError::DeadlineExceeded(message.to_string()))
}

fn parse_days(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|days| days.is_finite() && *days >= 0.0)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
