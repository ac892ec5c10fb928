use filter_syntax::FilterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    /// The principal lacks the permission named in the message.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An action handler reported a failure.
    #[error("Failed to perform action. {0}")]
    ActionFailed(String),

    #[error("{0}")]
    Upload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// The `code` the table widget expects in a response envelope.
    pub fn code(&self) -> i32 {
        match self {
            AdminError::Forbidden(_) => 403,
            AdminError::NotFound(_) => 404,
            AdminError::Filter(_) | AdminError::InvalidArgument(_) => 400,
            AdminError::ActionFailed(_) | AdminError::Upload(_) | AdminError::Io(_) => 500,
        }
    }
}
