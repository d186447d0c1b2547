//! API error types with JSON bodies.
//!
//! Every failure renders as `{ "error": "...", "message"?: "..." }`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::labeling::LabelingError;
use crate::review::ReviewError;
use crate::sessions::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Labeling failed: {0}")]
    Labeling(String),
    #[error("Completion failed: {0}")]
    Inference(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail, None),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail, None),
            ApiError::Labeling(detail) => {
                tracing::error!(detail = %detail, "Labeling request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to label data".to_string(),
                    Some(detail),
                )
            }
            ApiError::Inference(detail) => {
                tracing::error!(detail = %detail, "Completion request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to get completion".to_string(),
                    Some(detail),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(detail),
                )
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<LabelingError> for ApiError {
    fn from(err: LabelingError) -> Self {
        if err.is_validation() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Labeling(err.to_string())
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ReviewError::EmptyLabel => ApiError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_has_no_message() {
        let (status, json) = body_json(ApiError::BadRequest("No data items provided".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No data items provided");
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn internal_failures_carry_message() {
        let (status, json) = body_json(ApiError::Inference("backend down".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to get completion");
        assert_eq!(json["message"], "backend down");

        let (_, json) = body_json(ApiError::Labeling("no key".into())).await;
        assert_eq!(json["error"], "Failed to label data");
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err: ApiError = LabelingError::Validation("Too many items".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = LabelingError::NoJsonFound.into();
        assert!(matches!(err, ApiError::Labeling(_)));
    }

    #[test]
    fn review_errors_map_by_kind() {
        let err: ApiError = ReviewError::EmptyLabel.into();
        assert!(matches!(err, ApiError::BadRequest(_)));
        let err: ApiError = ReviewError::NotFound {
            item_id: "a".into(),
            label: "b".into(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
