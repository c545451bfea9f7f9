//! Axum route handlers for the Files API.

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::files::parser::{parse_file, FileParseError};

/// Uploads larger than this are rejected before parsing.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for the upload route: the file cap plus room for
/// multipart boundaries and part headers.
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_UPLOAD_BYTES + 64 * 1024;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFileResponse {
    pub text: String,
    pub content_type: String,
    pub characters: usize,
}

struct Upload {
    file_name: Option<String>,
    content_type: String,
    data: Bytes,
}

/// POST /api/v1/files/parse
///
/// Extracts plain text from an uploaded resume (multipart field `file`).
pub async fn handle_parse_file(
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ParsedFileResponse>, AppError> {
    let upload = read_upload(&mut multipart).await?;
    info!(
        user_id = %user.id,
        file_name = ?upload.file_name,
        content_type = %upload.content_type,
        bytes = upload.data.len(),
        "Parsing uploaded file"
    );

    let content_type = upload.content_type.clone();
    let text = tokio::task::spawn_blocking(move || parse_file(&upload.content_type, &upload.data))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("File parser task failed: {e}")))?
        .map_err(|e| match e {
            FileParseError::Unsupported(t) => AppError::UnsupportedFileType(t),
            FileParseError::Docx(msg) => AppError::UnprocessableEntity(msg),
        })?;

    Ok(Json(ParsedFileResponse {
        characters: text.chars().count(),
        text,
        content_type,
    }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Invalid file upload", e))?;
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(too_large());
        }

        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }

    Err(AppError::Validation(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large();
    }
    AppError::Validation(format!("{context}: {e}"))
}

fn too_large() -> AppError {
    AppError::PayloadTooLarge(format!(
        "Files must be at most {} MiB",
        MAX_UPLOAD_BYTES / (1024 * 1024)
    ))
}
