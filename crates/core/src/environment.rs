//! Production environment detection.
//!
//! Used as the default `prod_detect` capability so that checks configured
//! with `disable_in_prod` never fire on production deployments.

/// Environment variable naming the deployment environment.
pub const PRODUCTION_ENV_VAR: &str = "APP_ENV";

/// Values of [`PRODUCTION_ENV_VAR`] that mean "production".
const PRODUCTION_VALUES: &[&str] = &["production", "prod"];

/// Whether the process is running in production, per [`PRODUCTION_ENV_VAR`].
///
/// An unset or non-unicode variable means "not production".
pub fn is_production() -> bool {
    std::env::var(PRODUCTION_ENV_VAR)
        .map(|value| is_production_value(&value))
        .unwrap_or(false)
}

/// Whether `value` names a production environment (case-insensitive).
pub fn is_production_value(value: &str) -> bool {
    let value = value.trim();
    PRODUCTION_VALUES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(value))
}
