use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::header;

use crate::files::retrieve::{open_file, RetrieveError};
use crate::state::State as ServiceState;

/// Unauthenticated download path. Anyone holding the link gets the
/// decrypted bytes; there is no ownership check here.
pub async fn handler(
    State(state): State<ServiceState>,
    Path(file_id): Path<i64>,
) -> Result<Response, AccessApiError> {
    let file = open_file(&state, file_id).await?;

    // quoted-string escaping: upload validation blocks path characters but
    // not quotes, which would otherwise terminate the parameter early
    let filename = file.display_name.replace('\\', "\\\\").replace('"', "\\\"");
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        http::StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.clone()),
            (header::CONTENT_LENGTH, file.bytes.len().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum AccessApiError {
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
}

impl IntoResponse for AccessApiError {
    fn into_response(self) -> Response {
        match self {
            AccessApiError::Retrieve(RetrieveError::NotFound) => {
                (http::StatusCode::NOT_FOUND, "File not found".to_string()).into_response()
            }
            AccessApiError::Retrieve(e) => {
                tracing::error!("access failed: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to retrieve file".to_string(),
                )
                    .into_response()
            }
        }
    }
}
