//! Production-safe checks.
//!
//! [`Timebomb::nonprod`] exposes the same checks with production-skip
//! forced on, so a timebomb can nag developers and CI without ever firing
//! on a production deployment.

use crate::config::ConfigOverrides;
use crate::deadline::IntoDeadline;
use crate::delay::Delay;
use crate::error::TimebombError;
use crate::guard::{Phase, Timebomb};

/// `overrides` with `disable_in_prod` forced to `true`.
pub fn force_disable_in_prod(overrides: &ConfigOverrides) -> ConfigOverrides {
    overrides.clone().disable_in_prod(true)
}

/// A view of a [`Timebomb`] whose checks never run in production.
#[derive(Debug, Clone, Copy)]
pub struct NonProd<'a> {
    timebomb: &'a Timebomb,
}

impl Timebomb {
    /// Production-safe variants of this guard's checks.
    pub fn nonprod(&self) -> NonProd<'_> {
        NonProd { timebomb: self }
    }
}

impl NonProd<'_> {
    pub fn warn_after<D>(
        &self,
        deadline: D,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        self.timebomb
            .warn_after(deadline, &force_disable_in_prod(overrides))
    }

    pub fn fail_after<D>(
        &self,
        deadline: D,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        self.timebomb
            .fail_after(deadline, &force_disable_in_prod(overrides))
    }

    pub fn slow_after<D>(
        &self,
        deadline: D,
        delay: impl Into<Delay>,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        self.timebomb
            .slow_after(deadline, delay, &force_disable_in_prod(overrides))
    }

    pub async fn slow_after_async<D>(
        &self,
        deadline: D,
        delay: impl Into<Delay>,
        overrides: &ConfigOverrides,
    ) -> Result<Phase, TimebombError>
    where
        D: IntoDeadline,
    {
        self.timebomb
            .slow_after_async(deadline, delay, &force_disable_in_prod(overrides))
            .await
    }
}
