//! `/files` routes.
//!
//! Everything except `/access/{file_id}` sits behind bearer-token auth and
//! the per-user rate limiter; access is the unauthenticated capability
//! path, deliberately gated by nothing but knowledge of the id.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

pub mod access;
pub mod delete_file;
pub mod search;
pub mod share;
pub mod upload;

use crate::auth::require_auth;
use crate::state::State as ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let authenticated = Router::new()
        .route("/upload", post(upload::handler))
        .route("/search", get(search::handler))
        .route("/delete", delete(delete_file::handler))
        .route("/share", get(share::handler))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/access/:file_id", get(access::handler))
        .merge(authenticated)
}
