//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, serde_json::Value) {
    match &err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, error_body(err.to_string())),
        DomainError::Validation(validation) => {
            let mut body = error_body(validation.to_string());
            if let Some(field) = validation.field() {
                body["field"] = serde_json::Value::from(field);
            }
            (StatusCode::UNPROCESSABLE_ENTITY, body)
        }
        DomainError::ConcurrencyConflict(_) | DomainError::Deletion { .. } => {
            tracing::warn!(error = %err, "request conflicted with stored state");
            (StatusCode::CONFLICT, error_body(err.to_string()))
        }
        DomainError::Persistence(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(err.to_string()),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, StatusId};
    use domain::ValidationError;
    use row_store::StoreError;

    use super::*;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) =
            render(DomainError::not_found("customer", CustomerId::new(3)).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "customer not found: 3");
    }

    #[tokio::test]
    async fn validation_is_422_with_field() {
        let err = DomainError::Validation(ValidationError::InvalidTransition {
            target: StatusId::new(4),
            first_forbidden: StatusId::new(4),
        });
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Cannot change status to a value of 4 or higher");
        assert_eq!(body["field"], "status_id");
    }

    #[tokio::test]
    async fn deletion_failure_is_409() {
        let err = DomainError::Deletion {
            customer_id: CustomerId::new(1),
            source: StoreError::Unavailable("down".to_string()),
        };
        let (status, _) = render(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn persistence_failure_is_500() {
        let err = DomainError::Persistence(StoreError::Unavailable("down".to_string()));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("down"));
    }

    #[tokio::test]
    async fn bad_request_is_400() {
        let (status, body) = render(ApiError::BadRequest("size must be at least 1".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "size must be at least 1");
    }
}
