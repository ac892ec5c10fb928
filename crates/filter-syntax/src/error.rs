use thiserror::Error;

/// Errors raised while decoding or evaluating a filter tree. Every variant
/// aborts the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A node's `mode` is not one of `condition`, `group`, `in`, `date`.
    #[error("Unsupported filter mode: {0}")]
    UnsupportedMode(String),

    /// A `condition` node carries an operator (`type`) we do not know.
    #[error("Unsupported condition operator: {0}")]
    UnsupportedOperator(String),

    /// A `date` node carries a date type we do not know.
    #[error("Unsupported date mode: {0}")]
    UnsupportedDateMode(String),

    /// The field resolver could not map a field name.
    #[error("Unknown filter field: {0}")]
    UnknownField(String),

    /// A node that has to be folded into its predecessors has no usable
    /// `prefix`.
    #[error("Invalid combinator: {0}")]
    InvalidCombinator(String),

    /// The payload does not have the expected shape.
    #[error("Malformed filter payload: {0}")]
    MalformedPayload(String),
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::MalformedPayload(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
