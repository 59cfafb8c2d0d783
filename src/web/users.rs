use crate::domain::models::{NewUser, User, UserUpdate};
use crate::error::{AppError, AppResult};
use crate::services::storage::profile_picture_path;
use crate::state::SharedState;
use crate::web::multipart::Form;
use crate::web::session::Principal;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const MAX_PROFILE_PICTURE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Deserialize)]
pub struct CreateUserPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct ProfilePictureResponse {
    pub success: bool,
    pub url: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(create_user))
        .route(
            "/profile-picture",
            post(upload_profile_picture).layer(DefaultBodyLimit::max(MAX_PROFILE_PICTURE_BYTES * 2)),
        )
        .route(
            "/:external_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .with_state(state)
}

fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Registers the caller, or returns the existing record.
async fn create_user(
    principal: Principal,
    State(state): State<SharedState>,
    Json(payload): Json<CreateUserPayload>,
) -> AppResult<Json<User>> {
    let email = required_text(&payload.email, "email")?;
    if !email.contains('@') {
        return Err(AppError::validation("email is invalid"));
    }
    let new = NewUser {
        external_id: principal.0.clone(),
        first_name: required_text(&payload.first_name, "first_name")?,
        last_name: required_text(&payload.last_name, "last_name")?,
        email,
    };
    let user = state.store.find_or_create_user(&new).await?;
    tracing::info!("User {} ready for {}", user.id, principal.0);
    Ok(Json(user))
}

async fn get_user(
    principal: Principal,
    State(state): State<SharedState>,
    Path(external_id): Path<String>,
) -> AppResult<Json<User>> {
    principal.require_external_id(&external_id)?;
    let user = state
        .store
        .find_user_by_external_id(&external_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}

async fn update_user(
    principal: Principal,
    State(state): State<SharedState>,
    Path(external_id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    principal.require_external_id(&external_id)?;
    validate_update(&update)?;
    let user = state
        .store
        .update_user(&external_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}

fn validate_update(update: &UserUpdate) -> AppResult<()> {
    if let Some(name) = &update.first_name {
        required_text(name, "first_name")?;
    }
    if let Some(name) = &update.last_name {
        required_text(name, "last_name")?;
    }
    for (field, value) in [
        ("weight", update.weight),
        ("height", update.height),
        ("sleep_time", update.sleep_time),
    ] {
        if matches!(value, Some(v) if !v.is_finite() || v < 0.0) {
            return Err(AppError::validation(format!("{field} must be a positive number")));
        }
    }
    Ok(())
}

async fn delete_user(
    principal: Principal,
    State(state): State<SharedState>,
    Path(external_id): Path<String>,
) -> AppResult<StatusCode> {
    principal.require_external_id(&external_id)?;
    if !state.store.delete_user(&external_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    tracing::info!("Deleted user {}", external_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_profile_picture(
    principal: Principal,
    State(state): State<SharedState>,
    multipart: Multipart,
) -> AppResult<Json<ProfilePictureResponse>> {
    let user = principal.user(state.store.as_ref()).await?;
    let form = Form::read(multipart, MAX_PROFILE_PICTURE_BYTES).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::validation("No file uploaded"))?;

    let content_type = file.content_type.unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(AppError::validation("Only image files are allowed"));
    }
    if file.oversized || file.bytes.len() > MAX_PROFILE_PICTURE_BYTES {
        return Err(AppError::validation("File size exceeds 5MB limit"));
    }
    if file.bytes.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }

    let path = profile_picture_path(user.id, &file.file_name, Utc::now());
    let url = state
        .storage
        .upload(&path, file.bytes, &content_type)
        .await
        .map_err(|err| {
            tracing::error!("Profile picture upload failed for {}: {}", user.id, err);
            AppError::Upstream(err.to_string())
        })?;

    let update = UserUpdate {
        profile_picture_url: Some(url.clone()),
        ..UserUpdate::default()
    };
    state
        .store
        .update_user(&user.external_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(ProfilePictureResponse { success: true, url }))
}
