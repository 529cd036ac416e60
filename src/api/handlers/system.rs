use crate::api::models::HealthResponse;
use crate::core::error::AutocompleteError;
use axum::{http::Uri, BoxError, Json};

/// Handler for GET /health - Liveness probe, no authentication
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Fallback for unknown paths
pub async fn not_found(uri: Uri) -> AutocompleteError {
    AutocompleteError::NotFound(format!("No route for {}", uri.path()))
}

/// Map errors raised by tower middleware (request timeout) onto the API error type
pub async fn handle_middleware_error(err: BoxError) -> AutocompleteError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AutocompleteError::Timeout("request took too long".to_string())
    } else {
        AutocompleteError::Internal(format!("unhandled middleware error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.0, HealthResponse::ok());

        let value = serde_json::to_value(&response.0).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_not_found() {
        let error = not_found(Uri::from_static("/nowhere")).await;
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert!(error.to_string().contains("/nowhere"));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_408() {
        let error = handle_middleware_error(Box::new(tower::timeout::error::Elapsed::new())).await;
        assert_eq!(error.into_response().status(), StatusCode::REQUEST_TIMEOUT);
    }
}
