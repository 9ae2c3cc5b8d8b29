//! `timebomb-core` -- soft deadlines for code that must not live forever.
//!
//! A [`Timebomb`] compares the current time against a deadline and
//! escalates as the deadline approaches and passes:
//!
//! | Operation          | Before window | Inside window | Expired                 |
//! |--------------------|---------------|---------------|-------------------------|
//! | `warn_after`       | --            | --            | warn                    |
//! | `fail_after`       | --            | warn          | fail (`DeadlineExceeded`) |
//! | `slow_after[_async]` | --          | warn          | warn, then delay        |
//!
//! ```no_run
//! use timebomb_core::{ConfigOverrides, Timebomb};
//!
//! let timebomb = Timebomb::default();
//! // Remove the legacy export path before the new year.
//! timebomb.fail_after("2027-01-01", &ConfigOverrides::default())?;
//! # Ok::<(), timebomb_core::TimebombError>(())
//! ```

pub mod clock;
pub mod config;
pub mod deadline;
pub mod delay;
pub mod environment;
pub mod error;
pub mod guard;
pub mod nonprod;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigOverrides, GuardSettings, TimebombConfig};
pub use deadline::IntoDeadline;
pub use delay::Delay;
pub use error::TimebombError;
pub use guard::{Phase, Timebomb};
pub use nonprod::NonProd;
