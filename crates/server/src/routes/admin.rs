use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Delete the whole person index
///
/// `DELETE /api/v1/admin/index` — administrative reset. Registered records
/// are gone for good; stored image files are left on disk.
pub async fn delete_index(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    state.service.store().delete_index().await?;
    tracing::warn!("person index deleted by admin request");

    Ok(Json(json!({ "acknowledged": true })))
}
