use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Remote { status: u16, message: String },
    /// The request went out but no complete response came back.
    #[error("no response received from API: {0}")]
    Unreachable(String),
    /// The request could not be built or sent at all.
    #[error("request could not be constructed: {0}")]
    RequestConstruction(String),
    /// A required parameter was missing before any request was attempted.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn construction<T: Into<String>>(msg: T) -> Self {
        AppError::RequestConstruction(msg.into())
    }

    /// Remote and unreachable failures are transient; callers may retry them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Remote { .. } | AppError::Unreachable(_))
    }

    /// Caller or configuration defects that must never be swallowed per chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::RequestConstruction(_) | AppError::Validation(_)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
