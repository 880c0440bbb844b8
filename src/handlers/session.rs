use axum::{extract::State, Json};
use std::sync::Arc;

use super::{ApiError, MessageResponse};
use crate::models::*;
use crate::utils::ValidationError;
use crate::AppState;

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionInfo> {
    let session = state.session.lock().await;
    Json(state.pipeline.session_info(&session))
}

/// Store file server credentials for this session
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionInfo>, ApiError> {
    let mut session = state.session.lock().await;
    if let Err(e) = state.pipeline.login(&mut session, req).await {
        if e.downcast_ref::<ValidationError>().is_some() {
            return Err(e.into());
        }
        tracing::warn!("Login rejected: {:#}", e);
        return Err(ApiError::unauthorized(format!("Login failed: {:#}", e)));
    }
    Ok(Json(state.pipeline.session_info(&session)))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    let mut session = state.session.lock().await;
    state.pipeline.logout(&mut session);
    MessageResponse::new("Logged out")
}
