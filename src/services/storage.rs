use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const RESPONSE_FILE_CACHE_CONTROL: &str = "3600";

/// Object storage for attachments and profile pictures. Returns the public URL
/// of the stored object.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Supabase Storage over its REST API, authenticated with the service role key.
#[derive(Clone)]
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: String, service_key: String, bucket: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let size = bytes.len();
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, RESPONSE_FILE_CACHE_CONTROL)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("storage upload failed ({status}): {body}"));
        }
        tracing::debug!("Uploaded {} bytes to {}/{}", size, self.bucket, path);
        Ok(self.public_url(path))
    }
}

/// Extension of an uploaded file name, lowercased; `bin` when there is none.
pub fn file_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    }
}

fn timestamp_segment(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%.6fZ").to_string()
}

/// `{category}/{submission}/{question}/{option}/{timestamp}.{ext}`. The
/// timestamp keeps re-uploads for the same answer from colliding.
pub fn response_file_path(
    category: &str,
    submission_id: Uuid,
    question_id: Uuid,
    option_id: Uuid,
    file_name: &str,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{category}/{submission_id}/{question_id}/{option_id}/{}.{}",
        timestamp_segment(at),
        file_extension(file_name)
    )
}

pub fn profile_picture_path(user_id: Uuid, file_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "profile_pictures/{user_id}/{}.{}",
        timestamp_segment(at),
        file_extension(file_name)
    )
}
