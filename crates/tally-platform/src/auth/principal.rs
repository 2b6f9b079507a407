//! Principal Entity
//!
//! A registered account identified by email, holding a password hash, the
//! most recently issued bearer token, and the account's counter value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered principal.
///
/// Created exactly once by a successful registration and never deleted
/// during process lifetime. The email and password hash are immutable after
/// creation; only the counter is mutated, and only through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier, case-sensitive as supplied at registration
    pub email: String,

    /// Argon2id PHC hash string; never compared as plain text
    pub password_hash: String,

    /// Bounded counter value owned by this principal
    pub counter: i64,

    /// Most recently issued bearer token (informational; token verification
    /// is self-contained and does not consult this field)
    pub api_token: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        api_token: impl Into<String>,
        initial_counter: i64,
    ) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            counter: initial_counter,
            api_token: api_token.into(),
            created_at: Utc::now(),
        }
    }
}
