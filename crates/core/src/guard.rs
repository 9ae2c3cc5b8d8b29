//! The deadline guard: `warn_after`, `fail_after` and `slow_after`.
//!
//! Every check follows the same steps:
//!
//! 1. Merge the per-call [`ConfigOverrides`] over the [`Timebomb`] defaults.
//! 2. Return [`Phase::Disabled`] if `disable_in_prod` is set and the
//!    production detector fires (the deadline is not even parsed).
//! 3. Normalize the deadline and compute `diff = now - deadline` in ms.
//! 4. Branch on the resulting [`Phase`].
//!
//! Nothing is remembered between calls.

use std::time::Duration;

use crate::config::{ConfigOverrides, TimebombConfig, LOG_TARGET};
use crate::deadline::{format_deadline, IntoDeadline};
use crate::delay::Delay;
use crate::error::TimebombError;
use crate::types::{Timestamp, MILLIS_PER_DAY};

/// Where "now" falls relative to a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Production-skip is enabled and production was detected.
    Disabled,
    /// The deadline is further away than the warning window.
    Dormant,
    /// The deadline is within the warning window but has not passed.
    Approaching,
    /// The deadline has passed.
    Expired,
}

impl Phase {
    /// Classify a delta of `now - deadline` milliseconds against a warning
    /// window of `warning_window_ms`.
    ///
    /// The deadline instant itself (`diff == 0`) is not yet expired.
    pub fn classify(diff_ms: i64, warning_window_ms: f64) -> Phase {
        if diff_ms > 0 {
            Phase::Expired
        } else if diff_ms as f64 > -warning_window_ms {
            Phase::Approaching
        } else {
            Phase::Dormant
        }
    }
}

/// A deadline guard holding the default configuration for its checks.
///
/// Build one at startup and share it (it is `Send + Sync`); use
/// [`update_defaults`](Self::update_defaults) to adjust the defaults later.
#[derive(Debug, Clone, Default)]
pub struct Timebomb {
    defaults: TimebombConfig,
}

/// Result of steps 1-3 for a check that was not disabled.
struct Evaluation {
    config: TimebombConfig,
    deadline: Timestamp,
    diff_ms: i64,
    phase: Phase,
}

impl Timebomb {
    pub fn new(defaults: TimebombConfig) -> Self {
        Self { defaults }
    }

    /// A guard with defaults loaded via [`TimebombConfig::from_env`].
    pub fn from_env() -> Result<Self, TimebombError> {
        TimebombConfig::from_env().map(Self::new)
    }

    pub fn defaults(&self) -> &TimebombConfig {
        &self.defaults
    }

    /// Merge a partial configuration into the defaults.
    pub fn update_defaults(&mut self, overrides: &ConfigOverrides) {
        self.defaults.update(overrides);
    }

    /// Replace the defaults wholesale.
    pub fn replace_defaults(&mut self, defaults: TimebombConfig) {
        self.defaults = defaults;
    }

    // -----------------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------------

    /// Classify `deadline` without warning, failing or delaying.
    pub fn assess<D>(
        &self,
        deadline: D,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        Ok(self
            .evaluate(deadline, overrides)?
            .map_or(Phase::Disabled, |eval| eval.phase))
    }

    /// Warn once the deadline has passed. Never fails for an expired
    /// deadline, only for an unparseable one.
    pub fn warn_after<D>(
        &self,
        deadline: D,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        let Some(eval) = self.evaluate(deadline, overrides)? else {
            return Ok(Phase::Disabled);
        };

        if eval.phase == Phase::Expired {
            (eval.config.warn)(&expired_message(&eval.deadline));
        }
        Ok(eval.phase)
    }

    /// Fail once the deadline has passed; warn inside the warning window.
    ///
    /// With the default `fail` capability an expired deadline returns
    /// [`TimebombError::DeadlineExceeded`]. A custom capability that returns
    /// `Ok` lets the call succeed with [`Phase::Expired`].
    pub fn fail_after<D>(
        &self,
        deadline: D,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        let Some(eval) = self.evaluate(deadline, overrides)? else {
            return Ok(Phase::Disabled);
        };

        match eval.phase {
            Phase::Expired => (eval.config.fail)(&expired_message(&eval.deadline))?,
            Phase::Approaching => (eval.config.warn)(&format!(
                "Warning: Timebomb will soon expire at {}",
                format_deadline(&eval.deadline)
            )),
            Phase::Dormant | Phase::Disabled => {}
        }
        Ok(eval.phase)
    }

    /// Delay the calling thread once the deadline has passed; warn inside
    /// the warning window.
    ///
    /// Blocks with [`std::thread::sleep`]. Inside an async runtime use
    /// [`slow_after_async`](Self::slow_after_async) instead.
    pub fn slow_after<D>(
        &self,
        deadline: D,
        delay: impl Into<Delay>,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        let (phase, pause) = self.arm_slowdown(deadline, delay.into(), overrides)?;
        if let Some(pause) = pause {
            std::thread::sleep(pause);
        }
        Ok(phase)
    }

    /// Same contract as [`slow_after`](Self::slow_after), but suspends the
    /// current task instead of blocking its thread.
    pub async fn slow_after_async<D>(
        &self,
        deadline: D,
        delay: impl Into<Delay>,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        let (phase, pause) = self.arm_slowdown(deadline, delay.into(), overrides)?;
        if let Some(pause) = pause {
            tokio::time::sleep(pause).await;
        }
        Ok(phase)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Steps 1-3. `None` means the check is disabled.
    fn evaluate<D>(
        &self,
        deadline: D,
        overrides: &ConfigOverrides,
    ) -> Result<Option<Evaluation>, TimebombError>
    where
        D: IntoDeadline,
    {
        let config = self.defaults.merged(overrides);
        if config.is_disabled() {
            tracing::debug!(target: LOG_TARGET, "Production detected, skipping timebomb check");
            return Ok(None);
        }

        let deadline = deadline.into_deadline()?;
        let diff_ms = (config.clock.now() - deadline).num_milliseconds();
        let phase = Phase::classify(diff_ms, config.warning_window_ms());

        Ok(Some(Evaluation {
            config,
            deadline,
            diff_ms,
            phase,
        }))
    }

    /// Warn as `slow_after` does and return how long to pause, if at all.
    fn arm_slowdown<D>(
        &self,
        deadline: D,
        delay: Delay,
        overrides: &ConfigOverrides,
    ) -> Result<(Phase, Option<Duration>), TimebombError>
    where
        D: IntoDeadline,
    {
        let Some(eval) = self.evaluate(deadline, overrides)? else {
            return Ok((Phase::Disabled, None));
        };

        let pause = match eval.phase {
            Phase::Expired => {
                let days_past = eval.diff_ms as f64 / MILLIS_PER_DAY as f64;
                let pause = delay.resolve(days_past);
                tracing::debug!(
                    target: LOG_TARGET,
                    days_past,
                    delay_ms = pause.as_millis() as u64,
                    "Timebomb delay computed",
                );
                (eval.config.warn)(&format!(
                    "Timebomb expired after {}, slowing request by {}ms",
                    format_deadline(&eval.deadline),
                    pause.as_millis()
                ));
                Some(pause)
            }
            Phase::Approaching => {
                (eval.config.warn)(&format!(
                    "Warning: Timebomb will soon start slowing request at {}",
                    format_deadline(&eval.deadline)
                ));
                None
            }
            Phase::Dormant | Phase::Disabled => None,
        };
        Ok((eval.phase, pause))
    }
}

fn expired_message(deadline: &Timestamp) -> String {
    format!("Timebomb expired after {}", format_deadline(deadline))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap()
    }

    /// Overrides with a frozen clock and a warning sink that records into
    /// the returned vec.
    fn recording() -> (ConfigOverrides, Arc<Mutex<Vec<String>>>) {
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&warnings);
        let overrides = ConfigOverrides::new()
            .clock(FixedClock(now()))
            .warn_with(move |msg| sink.lock().unwrap().push(msg.to_string()));
        (overrides, warnings)
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[test]
    fn classify_boundaries() {
        let window = 7.0 * MILLIS_PER_DAY as f64;
        assert_eq!(Phase::classify(1, window), Phase::Expired);
        assert_eq!(Phase::classify(0, window), Phase::Approaching);
        assert_eq!(Phase::classify(-(7 * MILLIS_PER_DAY) + 1, window), Phase::Approaching);
        assert_eq!(Phase::classify(-(7 * MILLIS_PER_DAY), window), Phase::Dormant);
    }

    #[test]
    fn zero_window_never_approaches() {
        assert_eq!(Phase::classify(0, 0.0), Phase::Dormant);
        assert_eq!(Phase::classify(-1, 0.0), Phase::Dormant);
    }

    #[test]
    fn assess_does_not_call_capabilities() {
        let (overrides, warnings) = recording();
        let overrides = overrides.fail_with(|_| panic!("fail must not be called"));
        let guard = Timebomb::default();

        let phase = guard.assess(now() - chrono::Duration::days(1), &overrides).unwrap();
        assert_eq!(phase, Phase::Expired);
        assert!(warnings.lock().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // warn_after
    // -----------------------------------------------------------------------

    #[test]
    fn warn_after_is_silent_before_deadline() {
        let (overrides, warnings) = recording();
        let phase = Timebomb::default()
            .warn_after(now() + chrono::Duration::days(1), &overrides)
            .unwrap();
        assert_eq!(phase, Phase::Approaching);
        assert!(warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn warn_after_warns_once_expired() {
        let (overrides, warnings) = recording();
        Timebomb::default().warn_after("2026-05-19", &overrides).unwrap();
        assert_eq!(
            *warnings.lock().unwrap(),
            vec!["Timebomb expired after Tue, 19 May 2026 00:00:00 GMT".to_string()]
        );
    }

    // -----------------------------------------------------------------------
    // fail_after
    // -----------------------------------------------------------------------

    #[test]
    fn fail_after_raises_with_formatted_deadline() {
        let (overrides, warnings) = recording();
        let err = Timebomb::default()
            .fail_after(now() - chrono::Duration::days(1), &overrides)
            .unwrap_err();
        assert_matches!(
            err,
            TimebombError::DeadlineExceeded(ref msg) if msg == "Timebomb expired after Tue, 19 May 2026 12:00:00 GMT"
        );
        assert!(warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn fail_after_warns_inside_window() {
        let (overrides, warnings) = recording();
        let phase = Timebomb::default()
            .fail_after(now() + chrono::Duration::days(2), &overrides)
            .unwrap();
        assert_eq!(phase, Phase::Approaching);
        assert_eq!(
            *warnings.lock().unwrap(),
            vec!["Warning: Timebomb will soon expire at Fri, 22 May 2026 12:00:00 GMT".to_string()]
        );
    }

    #[test]
    fn fail_after_custom_fail_can_swallow() {
        let (overrides, _) = recording();
        let overrides = overrides.fail_with(|_| Ok(()));
        let phase = Timebomb::default()
            .fail_after(now() - chrono::Duration::days(1), &overrides)
            .unwrap();
        assert_eq!(phase, Phase::Expired);
    }

    // -----------------------------------------------------------------------
    // slow_after
    // -----------------------------------------------------------------------

    #[test]
    fn slow_after_passes_days_past_to_delay() {
        let (overrides, warnings) = recording();
        let seen = Arc::new(Mutex::new(None));
        let seen_in = Arc::clone(&seen);
        let delay = Delay::computed(move |days| {
            *seen_in.lock().unwrap() = Some(days);
            0.0
        });

        let phase = Timebomb::default()
            .slow_after(now() - chrono::Duration::hours(36), delay, &overrides)
            .unwrap();

        assert_eq!(phase, Phase::Expired);
        assert_eq!(*seen.lock().unwrap(), Some(1.5));
        assert_eq!(warnings.lock().unwrap().len(), 1);
        assert!(warnings.lock().unwrap()[0].ends_with("slowing request by 0ms"));
    }

    #[test]
    fn slow_after_does_not_compute_delay_before_deadline() {
        let (overrides, warnings) = recording();
        let delay = Delay::computed(|_| panic!("delay must not be computed"));
        let phase = Timebomb::default()
            .slow_after(now() + chrono::Duration::days(1), delay, &overrides)
            .unwrap();
        assert_eq!(phase, Phase::Approaching);
        assert_eq!(
            *warnings.lock().unwrap(),
            vec!["Warning: Timebomb will soon start slowing request at Thu, 21 May 2026 12:00:00 GMT"
                .to_string()]
        );
    }

    // -----------------------------------------------------------------------
    // Production-skip and defaults
    // -----------------------------------------------------------------------

    #[test]
    fn disabled_in_prod_skips_even_invalid_deadlines() {
        let (overrides, warnings) = recording();
        let overrides = overrides.disable_in_prod(true).prod_detect_with(|| true);
        let guard = Timebomb::default();

        assert_eq!(guard.fail_after("not a date", &overrides).unwrap(), Phase::Disabled);
        assert_eq!(guard.warn_after("not a date", &overrides).unwrap(), Phase::Disabled);
        assert!(warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn updated_defaults_apply_to_later_calls() {
        let (overrides, warnings) = recording();
        let mut guard = Timebomb::default();
        guard.update_defaults(&overrides.warning_period_days(1.0));

        let deadline = now() + chrono::Duration::days(2);
        let phase = guard.fail_after(deadline, &ConfigOverrides::default()).unwrap();
        assert_eq!(phase, Phase::Dormant);
        assert!(warnings.lock().unwrap().is_empty());

        // Per-call overrides still win over the updated defaults.
        let phase = guard
            .fail_after(deadline, &ConfigOverrides::new().warning_period_days(3.0))
            .unwrap();
        assert_eq!(phase, Phase::Approaching);
        assert_eq!(warnings.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_deadline_propagates() {
        let (overrides, _) = recording();
        assert_matches!(
            Timebomb::default().warn_after("tomorrow-ish", &overrides),
            Err(TimebombError::InvalidDeadline { .. })
        );
    }
}
