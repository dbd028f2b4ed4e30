//! Request credentials
//!
//! The fronting gateway authenticates callers and forwards the username in a
//! configurable header. Handlers that act on behalf of a user take
//! [`Credentials`]; a request without the header is rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::AppState;
use super::error::ApiError;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
}

impl FromRequestParts<AppState> for Credentials {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(state.config.username_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

        Ok(Self {
            username: username.to_string(),
        })
    }
}
