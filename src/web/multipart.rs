use crate::error::AppError;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use std::collections::HashMap;

/// Text values are ids and short strings; anything longer is rejected.
const MAX_TEXT_FIELD_BYTES: usize = 8 * 1024;

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Set when the part ran past the size cap. `bytes` is empty then.
    pub oversized: bool,
}

/// Text fields of a multipart form plus its file part, if any.
#[derive(Debug, Default)]
pub struct Form {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl Form {
    /// Reads every part. File content past `max_file_bytes` is drained and
    /// dropped, so the remaining text fields are still available.
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self, AppError> {
        let mut form = Form::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
            let name = field.name().unwrap_or_default().to_string();
            if is_file_part(&name, &field) {
                form.file = Some(read_file(field, max_file_bytes).await?);
            } else {
                let value = read_text(&name, field).await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Looks a field up under its snake_case or camelCase name.
    pub fn field(&self, snake: &str, camel: &str) -> Option<&str> {
        self.fields
            .get(snake)
            .or_else(|| self.fields.get(camel))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required_uuid(&self, snake: &str, camel: &str) -> Result<uuid::Uuid, AppError> {
        let raw = self
            .field(snake, camel)
            .ok_or_else(|| AppError::validation(format!("Missing required field: {snake}")))?;
        uuid::Uuid::parse_str(raw)
            .map_err(|_| AppError::validation(format!("{snake} must be a UUID")))
    }
}

fn is_file_part(name: &str, field: &Field<'_>) -> bool {
    matches!(name, "file" | "uploaded_file" | "uploadedFile") || field.file_name().is_some()
}

async fn read_file(mut field: Field<'_>, max_bytes: usize) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let mut bytes = Vec::new();
    let mut received = 0usize;
    let mut oversized = false;

    while let Some(chunk) = field.chunk().await.map_err(invalid_body)? {
        received += chunk.len();
        if oversized {
            continue;
        }
        if received > max_bytes {
            oversized = true;
            bytes = Vec::new();
        } else {
            bytes.extend_from_slice(&chunk);
        }
    }

    if oversized {
        tracing::warn!("Dropped oversized upload {} ({} bytes)", file_name, received);
    }
    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
        oversized,
    })
}

async fn read_text(name: &str, mut field: Field<'_>) -> Result<String, AppError> {
    let mut raw = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(invalid_body)? {
        if raw.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::validation(format!("Field {name} is too long")));
        }
        raw.extend_from_slice(&chunk);
    }
    String::from_utf8(raw).map_err(|_| AppError::validation(format!("Field {name} is not valid UTF-8")))
}

fn invalid_body(err: MultipartError) -> AppError {
    tracing::warn!("Rejected multipart body: {}", err);
    AppError::validation(format!("Invalid multipart body: {}", err.body_text()))
}
