use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>, frontend_dir: &str) -> Router {
    Router::new()
        .route("/health", get(handlers::healthcheck))
        // Form data
        .route("/api/models", get(handlers::templates::list_models))
        .route("/api/models/:model/template", get(handlers::templates::get_model_template))
        .route("/api/templates/variables", get(handlers::templates::get_template_variables))
        // Location routes
        .route("/api/locations", get(handlers::locations::list_locations))
        .route("/api/locations/lookup", get(handlers::locations::lookup_location))
        .route("/api/locations/resolve", post(handlers::locations::resolve_locations))
        // Pipeline routes
        .route("/api/submit", post(handlers::submit::submit))
        .route("/api/render-batch", post(handlers::submit::render_batch))
        // Session routes
        .route("/api/session", get(handlers::session::get_session))
        .route("/api/session/login", post(handlers::session::login))
        .route("/api/session/logout", post(handlers::session::logout))
        // Config server route
        .route("/configs/:filename", get(handlers::configs::serve_config))
        // Static files (frontend)
        .fallback_service(
            ServeDir::new(frontend_dir)
                .fallback(ServeFile::new(format!("{}/index.html", frontend_dir))),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
