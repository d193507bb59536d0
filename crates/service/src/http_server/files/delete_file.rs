use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::files::delete::{delete_file, DeleteError};
use crate::state::State as ServiceState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, DeleteApiError> {
    let file_id = query
        .file_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DeleteApiError::InvalidRequest("file_id is required".to_string()))?
        .parse::<i64>()
        .map_err(|_| DeleteApiError::InvalidRequest("invalid file_id".to_string()))?;

    delete_file(&state, user_id, file_id).await?;

    Ok(Json(DeleteResponse {
        message: "File deleted successfully".to_string(),
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Delete(#[from] DeleteError),
}

impl IntoResponse for DeleteApiError {
    fn into_response(self) -> Response {
        match self {
            DeleteApiError::InvalidRequest(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            DeleteApiError::Delete(DeleteError::NotFound) => {
                (http::StatusCode::NOT_FOUND, "File not found".to_string()).into_response()
            }
            DeleteApiError::Delete(e) => {
                tracing::error!("delete failed: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
