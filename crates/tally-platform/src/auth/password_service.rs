//! Password Authentication Service
//!
//! Secure password hashing using Argon2id. Verification always goes through
//! the hasher's constant-time routine; a stored digest is never compared to a
//! raw password with string equality.

use argon2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2, Algorithm, Params, Version,
};
use tracing::{debug, warn};

use crate::shared::error::{TallyError, Result};

/// Argon2id configuration
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations) (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
    /// Output hash length in bytes (default: 32)
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Low memory config for testing (faster but less secure)
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096, // 4 MiB
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Params {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .expect("Invalid Argon2 params")
    }
}

/// Password hashing service
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(config: Argon2Config) -> Self {
        let params = config.to_params();
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Self { argon2 }
    }

    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| TallyError::Internal {
                message: format!("Failed to hash password: {}", e),
            })?;

        debug!("Password hashed successfully");
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| TallyError::Internal {
            message: format!("Invalid password hash format: {}", e),
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                warn!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(TallyError::Internal {
                message: format!("Password verification error: {}", e),
            }),
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(Argon2Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(Argon2Config::testing())
    }

    #[test]
    fn test_hash_and_verify() {
        let svc = service();
        let hash = svc.hash_password("correct horse battery").unwrap();

        assert_ne!(hash, "correct horse battery");
        assert!(hash.starts_with("$argon2id$"));
        assert!(svc.verify_password("correct horse battery", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_fails_verification() {
        let svc = service();
        let hash = svc.hash_password("correct horse battery").unwrap();

        assert!(!svc.verify_password("wrong horse battery", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let svc = service();
        let a = svc.hash_password("same password").unwrap();
        let b = svc.hash_password("same password").unwrap();

        // Fresh salt per hash, so two hashes of the same input differ
        assert_ne!(a, b);
        assert!(svc.verify_password("same password", &a).unwrap());
        assert!(svc.verify_password("same password", &b).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        let svc = service();
        assert!(svc.verify_password("anything", "not-a-phc-string").is_err());
    }
}
