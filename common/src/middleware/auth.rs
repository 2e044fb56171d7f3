//! Authentication middleware.
//!
//! Validates bearer tokens and exposes the authenticated user to handlers.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};

use crate::config::JwtConfig;
use crate::errors::AppError;
use crate::utils::token::validate_token;

/// Identity attached to requests that passed [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User id from the token subject.
    pub id: i64,
    /// User email from the token.
    pub email: String,
}

/// Authentication middleware handler.
///
/// Rejects the request with 401 unless it carries a valid
/// `Authorization: Bearer <token>` header; on success the decoded
/// [`AuthUser`] is stored in the request extensions.
///
/// Install with `axum::middleware::from_fn_with_state(jwt_config, auth_middleware)`.
pub async fn auth_middleware(
    State(jwt): State<JwtConfig>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = {
        let token = extract_bearer_token(&req)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
        validate_token(token, &jwt)?
    };
    let user = AuthUser {
        id: claims.user_id()?,
        email: claims.email,
    };

    tracing::debug!(user_id = user.id, "request authenticated");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header.
pub fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("request is not authenticated".into()))
    }
}
