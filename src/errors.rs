use axum::http::StatusCode;
use thiserror::Error;

/// Failures of tracker operations. Unparseable dates never surface here;
/// they degrade to an empty canonical date instead.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Lookup(String),

    #[error("no student is logged in")]
    NoSession,

    #[error("failed to encode stored value: {0}")]
    Storage(#[from] serde_json::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let status = match &err {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::Duplicate(_) => StatusCode::CONFLICT,
            TrackerError::Lookup(_) => StatusCode::NOT_FOUND,
            TrackerError::NoSession => StatusCode::UNAUTHORIZED,
            TrackerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
