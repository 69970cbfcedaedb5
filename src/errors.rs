use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Dataset;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One data source failed; the fetcher moves on to the next one.
    #[error("Retrieval failure ({source_name}): {message}")]
    RetrievalFailure {
        source_name: String,
        message: String,
    },

    /// Every data source for a dataset failed.
    #[error("Dataset {dataset} unavailable: {message}")]
    DataUnavailable { dataset: Dataset, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub(crate) fn retrieval(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::RetrievalFailure {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::RetrievalFailure { .. } | AppError::DataUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_unavailable_names_dataset() {
        let err = AppError::DataUnavailable {
            dataset: Dataset::Tsdf,
            message: "no source succeeded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Dataset TSDF unavailable: no source succeeded"
        );
    }

    #[test]
    fn test_not_found_status() {
        let resp = AppError::NotFound("nothing here".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let resp = AppError::InternalError("secret".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
