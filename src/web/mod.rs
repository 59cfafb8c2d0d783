pub mod ai;
pub mod conversations;
pub mod multipart;
pub mod questions;
pub mod session;
pub mod submissions;
pub mod users;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/users", users::router(state.clone()))
        .nest("/questions", questions::router(state.clone()))
        .nest("/submissions", submissions::router(state.clone()))
        .merge(conversations::router(state.clone()))
        .merge(ai::router(state))
}
