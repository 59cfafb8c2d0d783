pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
pub mod web;

use crate::state::SharedState;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Full HTTP surface with tracing and CORS applied.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .merge(web::routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
