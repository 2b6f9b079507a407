//! Authentication Aggregate
//!
//! Credential issuance, bearer-token encoding/verification, and the
//! concurrency-safe user registry.

pub mod principal;
pub mod password_service;
pub mod token_service;
pub mod registry;
pub mod auth_api;

// Re-export main types
pub use principal::Principal;
pub use password_service::{Argon2Config, PasswordService};
pub use token_service::{TokenClaims, TokenConfig, TokenError, TokenService};
pub use registry::{RegistryConfig, UserRegistry};
pub use auth_api::{auth_router, AuthApiState};
