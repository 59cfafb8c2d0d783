use crate::db::Store;
use crate::domain::models::User;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub external_id: String,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
}

/// Signs a 24 hour session for the identity provider's user id.
pub fn sign_session(external_id: &str, key: &[u8]) -> Result<String, SessionError> {
    let exp = Utc::now() + Duration::hours(24);
    sign_session_until(external_id, exp.timestamp(), key)
}

pub fn sign_session_until(external_id: &str, exp: i64, key: &[u8]) -> Result<String, SessionError> {
    if external_id.is_empty() {
        return Err(SessionError::Invalid);
    }
    let payload = format!("{external_id}|{exp}");
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    ))
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let (payload_b64, sig_b64) = token.split_once('.').ok_or(SessionError::Invalid)?;
    let payload_bytes = general_purpose::STANDARD
        .decode(payload_b64)
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(sig_b64)
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes).map_err(|_| SessionError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| SessionError::Invalid)?;
    let (external_id, exp) = payload.rsplit_once('|').ok_or(SessionError::Invalid)?;
    if external_id.is_empty() {
        return Err(SessionError::Invalid);
    }
    let exp: i64 = exp.parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims {
        external_id: external_id.to_string(),
        exp,
    })
}

/// Bearer header first, then the `session` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                if let Some(rest) = pair.trim().strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

/// Authenticated caller, identified by the identity provider's user id.
///
/// ```ignore
/// async fn handler(Principal(external_id): Principal) -> AppResult<...> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct Principal(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = SharedState::from_ref(state);
        let token = extract_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = verify_session(&token, &shared_state.session_key).map_err(|e| {
            tracing::warn!("Session verification failed: {}", e);
            AppError::Unauthorized
        })?;
        Ok(Principal(claims.external_id))
    }
}

impl Principal {
    /// The caller's user record. A principal that never registered owns nothing.
    pub async fn user(&self, store: &dyn Store) -> Result<User, AppError> {
        store
            .find_user_by_external_id(&self.0)
            .await?
            .ok_or(AppError::Forbidden)
    }

    /// Rejects access to another user's data.
    pub async fn require_user(&self, store: &dyn Store, user_id: Uuid) -> Result<User, AppError> {
        let user = self.user(store).await?;
        if user.id != user_id {
            tracing::warn!("{} tried to access user {}", self.0, user_id);
            return Err(AppError::Forbidden);
        }
        Ok(user)
    }

    pub fn require_external_id(&self, external_id: &str) -> Result<(), AppError> {
        if self.0 != external_id {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}
