// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "workout_token";

/// Session lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// Token from an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Decode and validate a session token.
pub fn decode_session(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    if token_data.claims.sub.is_empty() {
        return None;
    }

    Some(AuthUser {
        username: token_data.claims.sub,
    })
}

/// The logged-in user, if the request carries a valid session.
pub fn current_user(jar: &CookieJar, headers: &HeaderMap, signing_key: &[u8]) -> Option<AuthUser> {
    // A stale cookie must not shadow a valid bearer token.
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(cookie.value(), signing_key))
        .or_else(|| bearer_token(headers).and_then(|token| decode_session(token, signing_key)))
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_user = current_user(&jar, request.headers(), &state.config.jwt_signing_key)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(username: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: username.to_string(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip() {
        let key = b"test_signing_key_32_bytes_long!!";
        let token = create_jwt("alice", key).unwrap();

        let user = decode_session(&token, key).unwrap();
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_jwt_wrong_key_rejected() {
        let token = create_jwt("alice", b"key_one_key_one_key_one_key_one!").unwrap();
        assert!(decode_session(&token, b"key_two_key_two_key_two_key_two!").is_none());
    }

    #[test]
    fn test_bearer_header_fallback() {
        let key = b"test_signing_key_32_bytes_long!!";
        let token = create_jwt("bob", key).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );

        let user = current_user(&CookieJar::new(), &headers, key).unwrap();
        assert_eq!(user.username, "bob");
    }

    #[test]
    fn test_stale_cookie_falls_back_to_bearer() {
        use axum_extra::extract::cookie::Cookie;

        let key = b"test_signing_key_32_bytes_long!!";
        let stale = create_jwt("alice", b"rotated_key_rotated_key_rotated!").unwrap();
        let token = create_jwt("bob", key).unwrap();

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, stale));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );

        let user = current_user(&jar, &headers, key).unwrap();
        assert_eq!(user.username, "bob");

        // A valid cookie still wins over the header
        let carol = create_jwt("carol", key).unwrap();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, carol));
        assert_eq!(current_user(&jar, &headers, key).unwrap().username, "carol");

        let junk = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "junk"));
        assert!(current_user(&junk, &HeaderMap::new(), key).is_none());
    }
}
