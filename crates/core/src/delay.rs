//! Artificial delays applied by `slow_after` once a deadline has passed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long an expired `slow_after` check suspends its caller.
#[derive(Clone)]
pub enum Delay {
    /// The same delay no matter how long ago the deadline passed.
    Fixed(Duration),
    /// Delay in milliseconds as a function of the (fractional) number of days
    /// since the deadline, so the nuisance can grow over time.
    Computed(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Delay {
    /// A fixed delay of `ms` milliseconds.
    pub fn millis(ms: u64) -> Self {
        Delay::Fixed(Duration::from_millis(ms))
    }

    /// A delay computed from the days past the deadline; the callback
    /// returns milliseconds.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Delay::Computed(Arc::new(f))
    }

    /// Resolve the delay for a deadline `days_past` days ago.
    ///
    /// Negative and NaN results from a computed delay resolve to zero;
    /// results too large for a [`Duration`] saturate.
    pub fn resolve(&self, days_past: f64) -> Duration {
        match self {
            Delay::Fixed(duration) => *duration,
            Delay::Computed(f) => millis_to_duration(f(days_past)),
        }
    }
}

impl From<Duration> for Delay {
    fn from(duration: Duration) -> Self {
        Delay::Fixed(duration)
    }
}

impl From<u64> for Delay {
    fn from(ms: u64) -> Self {
        Delay::millis(ms)
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::Fixed(duration) => f.debug_tuple("Fixed").field(duration).finish(),
            Delay::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

fn millis_to_duration(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
}
