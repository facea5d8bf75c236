// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: signup, login and logout.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::WorkoutStore;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::User;
use crate::services::password::{hash_password_blocking, verify_password_blocking};
use crate::time_utils::now_rfc3339;
use crate::AppState;

/// Routes reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

/// Routes that need a session (auth middleware applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", get(logout).post(logout))
}

/// Signup and login payload.
#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, max = 64), custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

/// Usernames double as document IDs, so keep them to a safe charset.
fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if !allowed || username == "." || username == ".." {
        return Err(ValidationError::new("username_charset"));
    }
    Ok(())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccountResponse {
    pub username: String,
}

/// Create an account.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<AccountResponse>)> {
    credentials
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if state.db.get_user(&credentials.username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let user = User {
        username: credentials.username,
        password_hash: hash_password_blocking(credentials.password).await?,
        created_at: now_rfc3339(),
    };

    if !state.db.create_user(&user).await? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    tracing::info!(username = %user.username, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            username: user.username,
        }),
    ))
}

/// Verify credentials and start a cookie session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<AccountResponse>)> {
    credentials
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = state.db.get_user(&credentials.username).await?;
    let verified = match &user {
        Some(u) => verify_password_blocking(credentials.password, u.password_hash.clone()).await?,
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::info!(username = %credentials.username, "Rejected login");
            return Err(AppError::InvalidCredentials);
        }
    };

    let jwt = create_jwt(&user.username, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_secure(&state))
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));

    tracing::info!(username = %user.username, "User logged in");

    Ok((
        jar.add(cookie),
        Json(AccountResponse {
            username: user.username,
        }),
    ))
}

/// End the session by expiring the cookie.
///
/// The expired cookie is sent even when the session came from a bearer
/// header, so a stale browser cookie is cleared as well.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(is_secure(&state))
        .build();
    removal.make_removal();

    (jar.add(removal), StatusCode::NO_CONTENT)
}

/// Mark cookies `Secure` unless the frontend is served over plain HTTP.
fn is_secure(state: &AppState) -> bool {
    state.config.frontend_url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_credentials_validation() {
        assert!(creds("alice", "pw").validate().is_ok());
        assert!(creds("a.b-c_d", "pw").validate().is_ok());
        assert!(creds("", "pw").validate().is_err());
        assert!(creds("alice", "").validate().is_err());
        assert!(creds("a/b", "pw").validate().is_err());
        assert!(creds("..", "pw").validate().is_err());
        assert!(creds(&"x".repeat(65), "pw").validate().is_err());
    }
}
