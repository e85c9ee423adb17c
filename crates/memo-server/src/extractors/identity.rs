//! Caller identity.
//!
//! Authentication happens upstream; the authenticated address arrives in
//! the `X-User-Email` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller. Rejects with 400 if the header is missing or blank.
#[derive(Debug, Clone)]
pub struct UserEmail(pub String);

impl<S> FromRequestParts<S> for UserEmail
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| UserEmail(v.to_string()))
            .ok_or_else(|| AppError::BadRequest("user email not found in request".to_string()))
    }
}
