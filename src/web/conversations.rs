use crate::domain::models::{Conversation, Message, NewMessage, User};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use crate::web::session::Principal;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_MESSAGE_CHARS: usize = 10_000;

#[derive(Serialize)]
pub struct ConversationEnvelope {
    pub conversation: Option<Conversation>,
}

#[derive(Serialize)]
pub struct MessagesEnvelope {
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
pub struct MessageEnvelope {
    pub message: Message,
}

#[derive(Deserialize)]
pub struct SendMessagePayload {
    pub conversation_id: Uuid,
    pub text: String,
    /// Set when the client stores the assistant's reply to the conversation.
    #[serde(default)]
    pub is_ai: bool,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/conversations/ai",
            get(get_ai_conversation).post(create_ai_conversation),
        )
        .route("/messages", post(send_message))
        .route("/messages/:conversation_id", get(list_messages))
        .with_state(state)
}

async fn create_ai_conversation(
    principal: Principal,
    State(state): State<SharedState>,
) -> AppResult<Json<ConversationEnvelope>> {
    let user = principal.user(state.store.as_ref()).await?;
    let conversation = state.store.create_ai_conversation(user.id).await?;
    Ok(Json(ConversationEnvelope {
        conversation: Some(conversation),
    }))
}

async fn get_ai_conversation(
    principal: Principal,
    State(state): State<SharedState>,
) -> AppResult<Json<ConversationEnvelope>> {
    let user = principal.user(state.store.as_ref()).await?;
    let conversation = state.store.find_ai_conversation(user.id).await?;
    Ok(Json(ConversationEnvelope { conversation }))
}

async fn owned_conversation(
    state: &SharedState,
    user: &User,
    conversation_id: Uuid,
) -> AppResult<Conversation> {
    let conversation = state
        .store
        .find_conversation(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;
    if conversation.user_id != Some(user.id) {
        return Err(AppError::Forbidden);
    }
    Ok(conversation)
}

async fn list_messages(
    principal: Principal,
    State(state): State<SharedState>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<MessagesEnvelope>> {
    let user = principal.user(state.store.as_ref()).await?;
    owned_conversation(&state, &user, conversation_id).await?;
    let messages = state.store.list_messages(conversation_id).await?;
    Ok(Json(MessagesEnvelope { messages }))
}

async fn send_message(
    principal: Principal,
    State(state): State<SharedState>,
    Json(payload): Json<SendMessagePayload>,
) -> AppResult<(StatusCode, Json<MessageEnvelope>)> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::validation("text is required"));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::validation("text is too long"));
    }

    let user = principal.user(state.store.as_ref()).await?;
    owned_conversation(&state, &user, payload.conversation_id).await?;

    let new = NewMessage {
        conversation_id: payload.conversation_id,
        sender_id: (!payload.is_ai).then_some(user.id),
        is_ai: payload.is_ai,
        text: text.to_string(),
    };
    let message = state.store.insert_message(&new).await?;
    Ok((StatusCode::CREATED, Json(MessageEnvelope { message })))
}
