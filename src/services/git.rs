// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Self-update from source control.
//!
//! The `/webhook` route runs `git pull` in the configured working tree.
//! GitHub signs deliveries with `X-Hub-Signature-256: sha256=<hex>`.

use crate::error::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::Path;
use tokio::process::Command;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Run `git pull` in `repo_dir` and return its standard output.
///
/// A non-zero exit is an error carrying stderr.
pub async fn pull(repo_dir: &Path) -> Result<String> {
    tracing::info!(repo_dir = %repo_dir.display(), "Running git pull");

    let output = Command::new("git")
        .arg("pull")
        .current_dir(repo_dir)
        .output()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to run git: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!(
            status = %output.status,
            stderr = %stderr.trim(),
            "git pull failed"
        );
        return Err(AppError::Internal(anyhow::anyhow!(
            "git pull exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    tracing::info!(output = %stdout.trim(), "git pull finished");
    Ok(stdout)
}

/// Check a GitHub `X-Hub-Signature-256` header against the request body.
pub fn verify_signature(secret: &[u8], body: &[u8], header: Option<&str>) -> bool {
    let Some(hex_sig) = header.and_then(|h| h.strip_prefix(SIGNATURE_PREFIX)) else {
        return false;
    };
    let Ok(signature) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Compute the header value GitHub would send for `body`.
pub fn sign(secret: &[u8], body: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(body);
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}
