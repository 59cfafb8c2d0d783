use crate::domain::scoring::ScoreScale;
use base64::{engine::general_purpose, Engine as _};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_STORAGE_BUCKET: &str = "chakrulo-storage-bucket";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("{0} is invalid: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub session_key: Vec<u8>,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub storage_bucket: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub score_scale: ScoreScale,
    pub derive_max_scores: bool,
    pub ai_rate_limit: usize,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let session_key = general_purpose::STANDARD
            .decode(required("SESSION_KEY")?)
            .map_err(|e| ConfigError::Invalid("SESSION_KEY", e.to_string()))?;
        if session_key.len() < 32 {
            return Err(ConfigError::Invalid(
                "SESSION_KEY",
                "must decode to at least 32 bytes".to_string(),
            ));
        }

        let defaults = ScoreScale::default();
        let score_scale = ScoreScale {
            physical_max: parse_positive(&get, "PHYSICAL_MAX_SCORE", defaults.physical_max)?,
            mental_max: parse_positive(&get, "MENTAL_MAX_SCORE", defaults.mental_max)?,
        };

        let derive_max_scores = match get("DERIVE_MAX_SCORES").as_deref() {
            None => false,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => {
                return Err(ConfigError::Invalid("DERIVE_MAX_SCORES", other.to_string()))
            }
        };

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let port = get("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{port}")
        });

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_positive(&get, "DB_MAX_CONNECTIONS", 10)?,
            session_key,
            supabase_url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            supabase_service_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            storage_bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string()),
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: get("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            score_scale,
            derive_max_scores,
            ai_rate_limit: parse_positive(&get, "AI_RATE_LIMIT", 20u32)? as usize,
            bind_addr,
        })
    }
}

fn parse_positive<G>(get: &G, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u32>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ConfigError::Invalid(key, raw)),
        },
    }
}
