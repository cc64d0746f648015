//! Order status edit endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{OrderId, StatusId};
use domain::StatusEditView;
use row_store::{OrderHistory, RowSource};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status_id: StatusId,
}

/// GET /orders/{id}/status: current status and the statuses on offer.
#[tracing::instrument(skip(state))]
pub async fn status<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<StatusEditView>, ApiError> {
    Ok(Json(state.workflow.status_edit_view(id).await?))
}

/// POST /orders/{id}/status: apply a manual status change.
///
/// Responds with the history entry recorded for the change.
#[tracing::instrument(skip(state))]
pub async fn change_status<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<OrderHistory>, ApiError> {
    let entry = state
        .workflow
        .apply_status_change(id, req.status_id)
        .await?;
    Ok(Json(entry))
}

/// GET /orders/{id}/history: status changes, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history<S: RowSource + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<OrderId>,
) -> Result<Json<Vec<OrderHistory>>, ApiError> {
    Ok(Json(state.workflow.order_history(id).await?))
}
