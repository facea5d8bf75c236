//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Login name (also used as document ID)
    pub username: String,
    /// PBKDF2 hash in `iterations$salt$hash` form
    pub password_hash: String,
    /// When the account was created (RFC 3339)
    pub created_at: String,
}
