use crate::db::Store;
use crate::domain::scoring::ScoreScale;
use crate::middleware::RateLimiter;
use crate::services::ai::TextGenerator;
use crate::services::storage::ObjectStorage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub storage: Arc<dyn ObjectStorage>,
    pub ai: Arc<dyn TextGenerator>,
    pub session_key: Vec<u8>,
    pub score_scale: ScoreScale,
    pub ai_limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;
