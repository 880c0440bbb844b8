use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::utils::is_safe_filename;
use crate::AppState;

/// Serve a generated configuration file from the output directory
pub async fn serve_config(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    // Security: prevent path traversal
    if !is_safe_filename(&filename) {
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let config_path = std::path::Path::new(&state.config.output_dir).join(&filename);

    match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => {
            tracing::debug!("Serving {}", config_path.display());
            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                content,
            )
                .into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "Config not found").into_response(),
    }
}
