use thiserror::Error;

/// Errors raised while loading evaluator settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Not an IANA timezone name.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid week start: {0}")]
    InvalidWeekStart(String),

    /// Expected `predicate` or `legacy`.
    #[error("Invalid null check mode: {0}")]
    InvalidNullCheck(String),

    /// The settings document is not valid JSON or has the wrong shape.
    #[error("Invalid settings document: {0}")]
    Document(#[from] serde_json::Error),
}
