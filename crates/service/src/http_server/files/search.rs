use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::database::{FileFilter, FileRecord};
use crate::files::search::{search_files, SearchError};
use crate::state::State as ServiceState;

/// Raw query parameters; empty strings count as unset, matching how
/// clients omit predicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub file_id: Option<String>,
    pub file_type: Option<String>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
}

impl SearchQuery {
    fn into_filter(self) -> Result<FileFilter, SearchApiError> {
        let file_id = match none_if_empty(self.file_id) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| SearchApiError::InvalidRequest("invalid file_id".to_string()))?,
            ),
            None => None,
        };

        Ok(FileFilter {
            file_id,
            file_type: none_if_empty(self.file_type),
            file_name: none_if_empty(self.file_name),
            file_path: none_if_empty(self.file_path),
        })
    }
}

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

pub async fn handler(
    State(state): State<ServiceState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<FileRecord>>, SearchApiError> {
    let filter = query.into_filter()?;
    let records = search_files(&state, user_id, &filter).await?;
    Ok(Json(records))
}

#[derive(Debug, thiserror::Error)]
pub enum SearchApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl IntoResponse for SearchApiError {
    fn into_response(self) -> Response {
        match self {
            SearchApiError::InvalidRequest(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            SearchApiError::Search(SearchError::NotFound) => {
                (http::StatusCode::NOT_FOUND, "No files found".to_string()).into_response()
            }
            SearchApiError::Search(e) => {
                tracing::error!("search failed: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
