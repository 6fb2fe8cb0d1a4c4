//! Caller identification for the JSON API.
//!
//! Tokens are HS256 JWTs carrying `{user_id, role, exp}`, taken from
//! `Authorization: Bearer` or, failing that, from the configured cookie.
//! The middleware resolves the token once and leaves an [`Actor`] in the
//! request extensions for handlers to extract.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::Role;
use crate::schedule::Actor;
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    /// Expiry as Unix seconds
    pub exp: i64,
}

/// Sign a token for `actor`; used by the login service and by tests
pub fn issue_token(
    secret: &str,
    actor: &Actor,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id: actor.user_id,
        role: actor.role,
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry, yielding the caller
pub fn verify_token(secret: &str, token: &str) -> Result<Actor, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(Actor::new(data.claims.user_id, data.claims.role))
}

/// Extract the token from request headers
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    // Try Authorization header first
    if let Some(auth_header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    // Fall back to the session cookie
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Auth middleware that validates tokens
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &state.config.auth.cookie_name)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let actor = verify_token(&state.config.auth.jwt_secret, &token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected token");
        ApiError::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Extractor for the caller resolved by [`auth_middleware`]
#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Admin-only guard for handlers
pub fn require_admin(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator access required"))
    }
}
