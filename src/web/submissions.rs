use crate::domain::models::{NewResponse, Response, Submission, SubmissionOutcome};
use crate::error::{AppError, AppResult};
use crate::services::submissions::{self, ResponseUpload};
use crate::state::SharedState;
use crate::web::multipart::Form;
use crate::web::session::Principal;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_RESPONSE_FILE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Deserialize)]
pub struct CreateSubmissionPayload {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct ResponseEnvelope {
    pub response: Response,
}

#[derive(Serialize)]
pub struct UploadedFileResponse {
    #[serde(rename = "uploadedFileUrl")]
    pub uploaded_file_url: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(create_submission))
        .route("/responses", post(upsert_response))
        .route(
            "/responses/upload",
            post(upload_response_file)
                .layer(DefaultBodyLimit::max(MAX_RESPONSE_FILE_BYTES + 64 * 1024)),
        )
        // Oversized attachments are drained by the form reader, not rejected here.
        .route("/responses/answer", post(save_answer).layer(DefaultBodyLimit::disable()))
        .route("/:user_id", get(latest_submission).patch(finalize_submission))
        .route("/:user_id/completed", get(latest_completed_submission))
        .route("/:user_id/start", post(start_submission))
        .route("/:user_id/submit", post(submit_submission))
        .with_state(state)
}

async fn create_submission(
    principal: Principal,
    State(state): State<SharedState>,
    Json(payload): Json<CreateSubmissionPayload>,
) -> AppResult<(StatusCode, Json<Submission>)> {
    let store = state.store.as_ref();
    principal.require_user(store, payload.user_id).await?;
    let submission = submissions::create(store, payload.user_id).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn latest_submission(
    principal: Principal,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Submission>> {
    let store = state.store.as_ref();
    principal.require_user(store, user_id).await?;
    submissions::get_latest(store, user_id, false)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("No submission found for this user"))
}

async fn latest_completed_submission(
    principal: Principal,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Submission>> {
    let store = state.store.as_ref();
    principal.require_user(store, user_id).await?;
    submissions::get_latest(store, user_id, true)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("No completed submission found for this user"))
}

async fn start_submission(
    principal: Principal,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Submission>> {
    let store = state.store.as_ref();
    principal.require_user(store, user_id).await?;
    Ok(Json(submissions::get_or_create(store, user_id).await?))
}

async fn finalize_submission(
    principal: Principal,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
    Json(outcome): Json<SubmissionOutcome>,
) -> AppResult<Json<Submission>> {
    let store = state.store.as_ref();
    principal.require_user(store, user_id).await?;
    Ok(Json(submissions::finalize(store, user_id, outcome).await?))
}

async fn submit_submission(
    principal: Principal,
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Submission>> {
    let store = state.store.as_ref();
    principal.require_user(store, user_id).await?;
    let submission =
        submissions::submit(store, state.ai.as_ref(), &state.score_scale, user_id).await?;
    Ok(Json(submission))
}

/// Answers may only be written into the caller's own submissions.
async fn require_submission_owner(
    principal: &Principal,
    state: &SharedState,
    submission_id: Uuid,
) -> AppResult<()> {
    let store = state.store.as_ref();
    let submission = store
        .find_submission(submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found"))?;
    principal.require_user(store, submission.user_id).await?;
    Ok(())
}

async fn upsert_response(
    principal: Principal,
    State(state): State<SharedState>,
    Json(payload): Json<NewResponse>,
) -> AppResult<(StatusCode, Json<ResponseEnvelope>)> {
    require_submission_owner(&principal, &state, payload.submission_id).await?;
    let response = submissions::upsert_response(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(ResponseEnvelope { response })))
}

fn upload_from_form(form: &mut Form) -> AppResult<Option<ResponseUpload>> {
    let submission_id = form.required_uuid("submission_id", "submissionId")?;
    let question_id = form.required_uuid("question_id", "questionId")?;
    let response_option_id = form.required_uuid("response_option_id", "responseOptionId")?;

    let Some(file) = form.file.take() else {
        return Ok(None);
    };
    let content_type = file
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .ok_or_else(|| AppError::validation("File content type is required"))?;
    if file.oversized || file.bytes.len() > MAX_RESPONSE_FILE_BYTES {
        return Err(AppError::validation("File size exceeds 10MB limit"));
    }
    if file.bytes.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }

    Ok(Some(ResponseUpload {
        submission_id,
        question_id,
        response_option_id,
        file_name: file.file_name,
        content_type,
        bytes: file.bytes,
    }))
}

async fn upload_response_file(
    principal: Principal,
    State(state): State<SharedState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadedFileResponse>)> {
    let mut form = Form::read(multipart, MAX_RESPONSE_FILE_BYTES).await?;
    let upload = upload_from_form(&mut form)?
        .ok_or_else(|| AppError::validation("No file uploaded"))?;
    require_submission_owner(&principal, &state, upload.submission_id).await?;

    let uploaded_file_url =
        submissions::upload_response_file(state.store.as_ref(), state.storage.as_ref(), upload)
            .await?;
    Ok((StatusCode::CREATED, Json(UploadedFileResponse { uploaded_file_url })))
}

/// Answer plus optional attachment in one request. The attachment never
/// blocks the answer.
async fn save_answer(
    principal: Principal,
    State(state): State<SharedState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ResponseEnvelope>)> {
    let mut form = Form::read(multipart, MAX_RESPONSE_FILE_BYTES).await?;
    let answer = NewResponse {
        submission_id: form.required_uuid("submission_id", "submissionId")?,
        question_id: form.required_uuid("question_id", "questionId")?,
        response_option_id: form.required_uuid("response_option_id", "responseOptionId")?,
        uploaded_file_url: None,
    };
    require_submission_owner(&principal, &state, answer.submission_id).await?;

    let attachment = match upload_from_form(&mut form) {
        Ok(upload) => upload,
        Err(err) => {
            tracing::warn!("Ignoring unusable attachment: {}", err);
            None
        }
    };

    let response = submissions::save_answer(
        state.store.as_ref(),
        state.storage.as_ref(),
        answer,
        attachment,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ResponseEnvelope { response })))
}
