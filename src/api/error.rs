use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::storage::StoreError;

/// Error body for every failed request. Clients key off `message`.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    kind: &'static str,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => ApiError::new(StatusCode::NOT_FOUND, "not_found", message),
            StoreError::Validation(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "validation", err.to_string())
            }
            StoreError::Database(_) | StoreError::Corrupt(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "store", err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.status != StatusCode::NOT_FOUND {
            tracing::warn!(status = %self.status, kind = self.kind, message = %self.message, "request failed");
        }
        let payload = ErrorResponse {
            message: self.message,
            kind: self.kind,
        };
        (self.status, Json(payload)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let not_found: ApiError = StoreError::pizza_not_found().into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "No pizza found with this id!");

        let invalid: ApiError = StoreError::Validation("pizzaName is required".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.kind, "validation");
        assert!(invalid.message.contains("pizzaName"));
    }
}
