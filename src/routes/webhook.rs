// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Source-control webhook: pull the latest code on push.

use crate::error::{AppError, Result};
use crate::services::git;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Router,
};
use std::sync::Arc;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", post(handle_push))
}

/// Run `git pull` and echo its output.
///
/// Requires a valid GitHub signature when `WEBHOOK_SECRET` is configured;
/// otherwise any caller can trigger it.
async fn handle_push(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    match &state.config.webhook_secret {
        Some(secret) => {
            let signature = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());
            if !git::verify_signature(secret.as_bytes(), &body, signature) {
                tracing::warn!(
                    has_signature = signature.is_some(),
                    "Security Alert: Webhook signature mismatch"
                );
                return Err(AppError::Forbidden("invalid webhook signature".to_string()));
            }
        }
        None => {
            tracing::warn!("Webhook secret not configured, accepting unauthenticated pull request");
        }
    }

    let event = headers
        .get("x-github-event")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown");
    tracing::info!(event, bytes = body.len(), "Webhook received");

    let output = git::pull(&state.config.repo_dir).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("output: {}", output),
    ))
}
