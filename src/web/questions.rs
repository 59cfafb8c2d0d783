use crate::domain::models::{Category, Question};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use crate::web::session::Principal;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:category", get(questions_by_category))
        .with_state(state)
}

async fn questions_by_category(
    _principal: Principal,
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Vec<Question>>> {
    let category = Category::try_from(slug.as_str())
        .map_err(|_| AppError::validation(format!("Invalid category: {slug}")))?;
    let questions = state.store.questions_by_category(category).await?;
    if questions.is_empty() {
        return Err(AppError::not_found(format!(
            "No questions found for category {}",
            category.as_str()
        )));
    }
    Ok(Json(questions))
}
