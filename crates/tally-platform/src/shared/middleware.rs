//! API Middleware
//!
//! Bearer-token authentication for Axum. The `Authenticated` extractor is
//! the request authenticator: it pulls the token out of the Authorization
//! header, verifies it with the token service, and resolves the identity
//! through the registry. The resolved principal is threaded into handlers
//! as an explicit value, never a shared per-request slot.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};
use std::sync::Arc;

use crate::auth::registry::UserRegistry;
use crate::auth::token_service::{extract_bearer_token, TokenService};
use crate::auth::principal::Principal;
use crate::shared::error::TallyError;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub token_service: Arc<TokenService>,
    pub registry: Arc<UserRegistry>,
}

/// Authenticated principal extractor.
///
/// Validates the bearer token and resolves the owning principal. A valid
/// token for an email with no registered principal is still rejected as
/// unauthorized (stale or unknown identity).
pub struct Authenticated(pub Principal);

impl std::ops::Deref for Authenticated {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = TallyError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // AppState is injected into extensions by the AuthLayer below
        let app_state = parts
            .extensions
            .get::<AppState>()
            .ok_or_else(|| TallyError::internal("Auth services not configured"))?;

        // Prefix must be exactly "Bearer " with original casing; no trimming
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| TallyError::unauthorized("A valid token must be passed."))?;

        let email = app_state.token_service.verify(token).map_err(TallyError::from)?;

        let principal = app_state
            .registry
            .resolve(&email)
            .ok_or_else(|| TallyError::unauthorized("A valid token must be passed."))?;

        Ok(Authenticated(principal))
    }
}

/// Middleware layer that injects AppState into request extensions
/// so the Authenticated extractor can reach the shared services.
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use axum::response::Response;

#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}
