//! Authentication middleware
//!
//! Resolves `Authorization: Bearer <token>` into a `CallerIdentity` stored in
//! the request extensions. Identity is taken from the token alone; the
//! credential store is not consulted.

use crate::api::handlers::AppState;
use crate::core::error::{AuthFailure, Result, ShopError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Authenticated caller, as proven by a valid token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
}

/// Extract the bearer token from request headers
///
/// The header value is split on single spaces. The first segment must be
/// exactly `Bearer` and the second must be non-empty.
pub fn parse_bearer(headers: &HeaderMap) -> std::result::Result<&str, AuthFailure> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthFailure::MissingCredential)?;

    let value = value.to_str().map_err(|_| AuthFailure::MalformedCredential)?;

    let mut parts = value.split(' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();

    if scheme != "Bearer" || token.is_empty() {
        return Err(AuthFailure::MalformedCredential);
    }

    Ok(token)
}

/// Authentication middleware for the protected router
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match parse_bearer(request.headers()) {
        Ok(token) => token,
        Err(failure) => return ShopError::Authentication(failure).into_response(),
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(user_id = %claims.sub, "Caller authenticated");

    request.extensions_mut().insert(CallerIdentity {
        user_id: claims.sub,
    });

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or(ShopError::Authentication(AuthFailure::MissingCredential))
    }
}
