use axum::{extract::State, Json};
use std::sync::Arc;

use super::ApiError;
use crate::models::*;
use crate::AppState;

/// Run one form submission. Holding the session lock keeps runs sequential.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    let mut session = state.session.lock().await;
    let outcome = state.pipeline.submit(&mut session, req).await?;
    Ok(Json(outcome))
}

/// Render every row of the record file
pub async fn render_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderBatchRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let session = state.session.lock().await;
    let report = state.pipeline.render_batch(&session, req).await?;
    Ok(Json(report))
}
