//! User identity extraction.
//!
//! Authentication itself lives in front of this service; by the time a
//! request arrives the gateway has already validated the session and
//! stamped the user id onto the `X-User-Id` header. This extractor only
//! checks that the header is present and a well-formed UUID.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use custodia_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct UserContext {
    pub user_id: Uuid,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing X-User-Id header".to_string(),
                ))
            })?;

        let user_id = Uuid::parse_str(raw).map_err(|_| {
            HttpAppError(AppError::Unauthorized(
                "X-User-Id header is not a valid UUID".to_string(),
            ))
        })?;

        Ok(UserContext { user_id })
    }
}
