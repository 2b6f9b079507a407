//! Tally Platform
//!
//! Core library for the Tally counter service:
//! - Concurrency-safe user registry (registration, login, resolution)
//! - Argon2id password hashing
//! - JWT bearer tokens (HS256) with typed verification failures
//! - Bounds-checked counter operations
//! - Axum handlers and the bearer-token request authenticator
//!
//! ## Module Organization (Aggregate-based)
//!
//! - `auth` - principals, passwords, tokens, registry, auth endpoints
//! - `counter` - counter logic and endpoints
//! - `shared` - error types and middleware

pub mod auth;
pub mod counter;
pub mod shared;

// Re-export common types
pub use shared::error::{Result, TallyError};
pub use shared::middleware::{AppState, Authenticated, AuthLayer};

pub use auth::{
    auth_router, Argon2Config, AuthApiState, PasswordService, Principal, RegistryConfig,
    TokenClaims, TokenConfig, TokenError, TokenService, UserRegistry,
};
pub use counter::{counter_router, CounterApiState, CounterLimits, CounterService};
