use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Failures of a `SolutionStore`.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Failures of `SolverService` operations.
#[derive(Debug, ThisError)]
pub enum ServiceError {
    #[error("expected 9 numbers, got {len}")]
    InvalidLength { len: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("search task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What a handler reports back to the client.
#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("solution not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidLength { .. } => Self::BadRequest(err.to_string()),
            ServiceError::Store(_) | ServiceError::Join(_) => {
                log::error!("{err}");
                Self::Internal(err.to_string())
            }
        }
    }
}

/// Bodies that are not a JSON array of integers.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Ids that are not a non-negative integer.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_length_is_bad_request() {
        let err = ApiError::from(ServiceError::InvalidLength { len: 8 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "expected 9 numbers, got 8");
    }

    #[test]
    fn store_failure_is_internal() {
        let err = ApiError::from(ServiceError::Store(StoreError::Poisoned));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "store lock poisoned");
    }

    #[test]
    fn not_found_response() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
