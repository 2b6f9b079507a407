//! User Registry
//!
//! The concurrency-safe credential store: registration, login, identity
//! resolution, and locked counter updates. This is the only shared mutable
//! resource in the service; a single RwLock guards the map, and the
//! existence-check-then-insert in registration runs under one write-lock
//! acquisition so concurrent registrations of the same email cannot both
//! succeed.
//!
//! Constructed once at startup and passed around as an `Arc` handle; the
//! lock is never held across an await point (hashing and token work happen
//! before it is taken).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use tracing::info;

use crate::auth::password_service::PasswordService;
use crate::auth::principal::Principal;
use crate::auth::token_service::TokenService;
use crate::shared::error::{Result, TallyError};

/// Registration validation settings
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Minimum accepted password length
    pub min_password_length: usize,

    /// Counter value assigned to a newly registered principal
    pub initial_counter: i64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_password_length: 10,
            initial_counter: 1,
        }
    }
}

/// Concurrency-safe store of registered principals, keyed by email
pub struct UserRegistry {
    users: RwLock<HashMap<String, Principal>>,
    password_service: Arc<PasswordService>,
    token_service: Arc<TokenService>,
    email_pattern: Regex,
    config: RegistryConfig,
}

impl UserRegistry {
    pub fn new(
        password_service: Arc<PasswordService>,
        token_service: Arc<TokenService>,
        config: RegistryConfig,
    ) -> Self {
        // Standard mailbox syntax check: one @, non-empty local part, dotted domain
        let email_pattern = Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("email regex is valid");

        Self {
            users: RwLock::new(HashMap::new()),
            password_service,
            token_service,
            email_pattern,
            config,
        }
    }

    /// Register a new principal and return its bearer token.
    ///
    /// Validation failures and duplicate emails surface as one 400-class
    /// error; the uniqueness check and the insert are atomic as a unit.
    pub fn register(&self, email: &str, password: &str) -> Result<String> {
        self.validate_registration(email, password)?;

        // Hash and sign outside the lock; only the check-then-insert is guarded
        let password_hash = self.password_service.hash_password(password)?;
        let api_token = self.token_service.issue(email)?;

        {
            let mut users = self.users.write();
            if users.contains_key(email) {
                return Err(Self::invalid_registration());
            }
            users.insert(
                email.to_string(),
                Principal::new(email, password_hash, api_token.clone(), self.config.initial_counter),
            );
        }

        info!(email = %email, "Registered new principal");
        Ok(api_token)
    }

    /// Authenticate an existing principal and return its stored token.
    ///
    /// All failures are one 400-class error; the message distinguishes
    /// unknown email from password mismatch, the status class does not.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        if email.is_empty() || password.is_empty() {
            return Err(TallyError::validation(
                "Invalid parameters: 'email' and 'password' must not be empty.",
            ));
        }

        // Clone the fields we need so the hash verification runs unlocked
        let (password_hash, api_token) = {
            let users = self.users.read();
            let principal = users.get(email).ok_or_else(|| {
                TallyError::validation(format!("Invalid parameters: no user found with email {}.", email))
            })?;
            (principal.password_hash.clone(), principal.api_token.clone())
        };

        if !self.password_service.verify_password(password, &password_hash)? {
            return Err(TallyError::validation("Invalid password supplied."));
        }

        Ok(api_token)
    }

    /// Look up a principal by email (snapshot clone). Not HTTP-facing; used
    /// by the request authenticator after token verification.
    pub fn resolve(&self, email: &str) -> Option<Principal> {
        self.users.read().get(email).cloned()
    }

    /// Read-modify-write of a principal's counter under the write lock.
    ///
    /// The closure receives the current value and either returns the new
    /// value to persist or an error, in which case the stored value is
    /// untouched.
    pub fn update_counter<F>(&self, email: &str, f: F) -> Result<i64>
    where
        F: FnOnce(i64) -> Result<i64>,
    {
        let mut users = self.users.write();
        let principal = users.get_mut(email).ok_or_else(|| {
            TallyError::unauthorized("A valid token must be passed.")
        })?;

        let new_value = f(principal.counter)?;
        principal.counter = new_value;
        Ok(new_value)
    }

    /// Number of registered principals
    pub fn count(&self) -> usize {
        self.users.read().len()
    }

    fn validate_registration(&self, email: &str, password: &str) -> Result<()> {
        let valid = !email.is_empty()
            && !password.is_empty()
            && self.email_pattern.is_match(email)
            && password.len() >= self.config.min_password_length
            && !self.users.read().contains_key(email);

        if valid {
            Ok(())
        } else {
            Err(Self::invalid_registration())
        }
    }

    fn invalid_registration() -> TallyError {
        TallyError::validation(
            "Invalid parameters: 'email' and 'password' must not be empty, \
             email must be valid, password must be minimum length 10, and \
             email must not be taken by an existing user.",
        )
    }
}
