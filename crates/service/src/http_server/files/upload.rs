use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::files::upload::{store_file, UploadError};
use crate::state::State as ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub id: i64,
    pub file_name: String,
    pub public_url: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadApiError> {
    let mut file: Option<(String, Bytes)> = None;

    // Parse multipart form data; the first "file" field wins
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Multipart parsing error: {}", e);
        UploadApiError::Multipart(e.to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" if file.is_none() => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Error reading file data for {}: {}", filename, e);
                    UploadApiError::Multipart(e.to_string())
                })?;

                file = Some((filename, data));
            }
            _ => {
                tracing::warn!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (filename, data) =
        file.ok_or_else(|| UploadApiError::Upload(UploadError::InvalidUpload(
            "a file field is required".to_string(),
        )))?;

    let stored = store_file(&state, user_id, &filename, data).await?;

    Ok((
        http::StatusCode::OK,
        Json(UploadResponse {
            message: "File uploaded and encrypted successfully".to_string(),
            id: stored.id,
            file_name: filename,
            public_url: stored.public_url,
        }),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum UploadApiError {
    #[error("Multipart error: {0}")]
    Multipart(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl IntoResponse for UploadApiError {
    fn into_response(self) -> Response {
        match self {
            UploadApiError::Multipart(msg)
            | UploadApiError::Upload(UploadError::InvalidUpload(msg)) => (
                http::StatusCode::BAD_REQUEST,
                format!("Invalid file upload: {}", msg),
            )
                .into_response(),
            UploadApiError::Upload(e) => {
                // disk/crypto/metadata specifics stay in the log, never
                // in the response body
                tracing::error!("upload failed: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to save file".to_string(),
                )
                    .into_response()
            }
        }
    }
}
