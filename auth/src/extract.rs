//! Axum extractor for the authenticated caller.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::jwt::JwtKeys;

/// The authenticated caller's user id, extracted from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,

    #[error("Invalid authentication credentials")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            Json(json!({"detail": self.to_string()})),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingCredentials)?;

        let keys = JwtKeys::from_ref(state);
        let user_id = keys.verify(token).map_err(|err| {
            debug!("rejected bearer token: {}", err);
            AuthError::InvalidToken
        })?;

        Ok(AuthUser(user_id))
    }
}
