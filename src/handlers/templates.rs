use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::models::{ModelInfo, TemplateVariable};
use crate::render::{template_variables, Renderer};
use crate::AppState;

/// Models offered by the form, with their template file status
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelInfo>> {
    let renderer = Renderer::new(&state.config.templates_dir);
    let mut models = Vec::with_capacity(state.config.device_models.len());
    for name in &state.config.device_models {
        let path = renderer.template_path(name);
        let template_available = tokio::fs::try_exists(&path).await.unwrap_or(false);
        models.push(ModelInfo {
            name: name.clone(),
            template: path.to_string_lossy().into_owned(),
            template_available,
        });
    }
    Json(models)
}

/// Template source for one model; 404 when the model has no template file
pub async fn get_model_template(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let content = Renderer::new(&state.config.templates_dir).load(&model).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], content))
}

/// Variables available to config templates
pub async fn get_template_variables() -> Json<Vec<TemplateVariable>> {
    Json(template_variables())
}
