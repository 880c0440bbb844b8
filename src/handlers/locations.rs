use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::locations::{find_location, resolve_many, LocationTable};
use crate::models::*;
use crate::AppState;

async fn load_table(state: &AppState) -> Result<LocationTable, ApiError> {
    Ok(LocationTable::load(&state.config.network_table).await?)
}

/// List all locations in file order
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationEntry>>, ApiError> {
    let table = load_table(&state).await?;
    Ok(Json(table.entries().to_vec()))
}

/// Find the location containing `?ip=`
pub async fn lookup_location(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LocationMatch>, ApiError> {
    let table = load_table(&state).await?;
    match find_location(&query.ip, &table) {
        Ok(Some(m)) => Ok(Json(m)),
        Ok(None) => Err(ApiError::not_found(&format!("Location for {}", query.ip.trim()))),
        Err(e) => Err(ApiError::bad_request(e.to_string())),
    }
}

/// Resolve a list of addresses in one go
pub async fn resolve_locations(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let table = load_table(&state).await?;
    Ok(Json(resolve_many(&req.ips, &table)))
}
