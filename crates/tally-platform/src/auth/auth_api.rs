//! Auth API Endpoints
//!
//! The two unauthenticated endpoints:
//! - POST /v1/register - Create a principal, returns its bearer token
//! - POST /v1/login - Password login, returns the stored bearer token

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::registry::UserRegistry;
use crate::shared::error::TallyError;

/// Registration / login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    /// Email address
    #[serde(default)]
    pub email: String,

    /// Password
    #[serde(default)]
    pub password: String,
}

/// Registration response
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    /// Bearer token for the new principal
    pub token: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the principal
    pub api_token: String,
}

/// Auth endpoints state
#[derive(Clone)]
pub struct AuthApiState {
    pub registry: Arc<UserRegistry>,
}

/// Register a new principal
///
/// Validates the email and password, stores the principal with its counter
/// at the initial value, and returns a freshly issued bearer token.
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    operation_id = "postRegister",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Registration successful", body = RegisterResponse),
        (status = 400, description = "Invalid parameters or email already taken")
    )
)]
pub async fn register(
    State(state): State<AuthApiState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<RegisterResponse>, TallyError> {
    let token = state.registry.register(&req.email, &req.password)?;
    Ok(Json(RegisterResponse { token }))
}

/// Login with email and password
///
/// Verifies the credentials against the stored hash and returns the
/// principal's bearer token.
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postLogin",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Unknown email or wrong password")
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, TallyError> {
    let api_token = state.registry.login(&req.email, &req.password)?;
    Ok(Json(LoginResponse { api_token }))
}

pub fn auth_router(state: AuthApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .with_state(state)
}
