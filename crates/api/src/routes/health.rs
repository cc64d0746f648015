//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use row_store::RowSource;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Entries in the order status catalog, as seen by the row source.
    pub order_statuses: usize,
}

/// GET /health: reports whether the row source answers reads.
pub async fn check<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.source.list_order_statuses().await {
        Ok(statuses) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                order_statuses: statuses.len(),
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "row source health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    order_statuses: 0,
                }),
            )
        }
    }
}
