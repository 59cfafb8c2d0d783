use crate::error::{AppError, AppResult};
use crate::middleware::ai_rate_limit;
use crate::services::recommendations::request_recommendations;
use crate::state::SharedState;
use crate::web::session::Principal;
use axum::{extract::State, middleware, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

const MAX_PROMPT_CHARS: usize = 20_000;

#[derive(Deserialize)]
pub struct PromptPayload {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct TextResponse {
    pub text: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/gemini", post(generate))
        .route_layer(middleware::from_fn_with_state(state.clone(), ai_rate_limit))
        .with_state(state)
}

/// Thin proxy to the text generator for clients that build their own prompts.
async fn generate(
    Principal(external_id): Principal,
    State(state): State<SharedState>,
    Json(payload): Json<PromptPayload>,
) -> AppResult<Json<TextResponse>> {
    let prompt = payload.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::validation("prompt is required"));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(AppError::validation("prompt is too long"));
    }
    tracing::debug!("Generating text for {}", external_id);
    let text = request_recommendations(state.ai.as_ref(), prompt).await?;
    Ok(Json(TextResponse { text }))
}
