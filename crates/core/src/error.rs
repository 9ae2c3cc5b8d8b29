/// Errors produced by the deadline guard.
///
/// Only [`TimebombError::DeadlineExceeded`] is a "business" failure; the
/// other variants report bad input.
#[derive(Debug, thiserror::Error)]
pub enum TimebombError {
    /// The deadline has passed and the fail capability raised it.
    #[error("{0}")]
    DeadlineExceeded(String),

    /// A deadline string could not be parsed into a timestamp.
    #[error("Invalid deadline '{input}': {source}")]
    InvalidDeadline {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// An environment variable held a value that could not be parsed.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidConfig { var: &'static str, value: String },
}

impl TimebombError {
    /// Whether this error is the deadline itself firing, as opposed to bad
    /// input or configuration.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, TimebombError::DeadlineExceeded(_))
    }
}
