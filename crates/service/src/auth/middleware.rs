//! Request admission: resolve the bearer token, then rate-limit the
//! verified identity before any handler runs.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::State as ServiceState;

/// The verified identity of the caller, injected into request extensions
/// for handlers behind [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

pub async fn require_auth(
    State(state): State<ServiceState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token,
        None => {
            return (StatusCode::UNAUTHORIZED, "Authorization header missing").into_response();
        }
    };

    let user_id = match state.authenticator().verify(token) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!("rejected bearer token: {}", e);
            return (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response();
        }
    };

    // Admission is gated on the resolved identity, not the raw credential.
    if !state.limiter().allow(user_id) {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
    }

    request.extensions_mut().insert(CurrentUser(user_id));
    next.run(request).await
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
