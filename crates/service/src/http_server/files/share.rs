use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::files::share::{share_link, ShareError};
use crate::state::State as ServiceState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareQuery {
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub file_id: i64,
    pub url: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<ShareResponse>, ShareApiError> {
    let file_id = query
        .file_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShareApiError::InvalidRequest("file_id is required".to_string()))?
        .parse::<i64>()
        .map_err(|_| ShareApiError::InvalidRequest("invalid file_id".to_string()))?;

    let url = share_link(&state, user_id, file_id).await?;

    Ok(Json(ShareResponse { file_id, url }))
}

#[derive(Debug, thiserror::Error)]
pub enum ShareApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Share(#[from] ShareError),
}

impl IntoResponse for ShareApiError {
    fn into_response(self) -> Response {
        match self {
            ShareApiError::InvalidRequest(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ShareApiError::Share(ShareError::NotFound) => {
                (http::StatusCode::NOT_FOUND, "File not found".to_string()).into_response()
            }
            ShareApiError::Share(e) => {
                tracing::error!("share link failed: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
