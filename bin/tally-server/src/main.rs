//! Tally Server
//!
//! Token-authenticated counter REST API:
//! - POST /v1/register, POST /v1/login (unauthenticated)
//! - GET /v1/next, GET /v1/current, POST /v1/current (bearer token)
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TALLY_API_PORT` | `8080` | HTTP API port |
//! | `TALLY_JWT_SECRET` | - | HS256 signing secret (required) |
//! | `TALLY_JWT_ISSUER` | - | Optional issuer claim + validation |
//! | `TALLY_TOKEN_EXPIRY_SECS` | - | Optional token lifetime |
//! | `LOG_FORMAT` | text | `json` for JSON logs |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use tally_platform::{
    auth_router, counter_router, AppState, Argon2Config, AuthApiState, AuthLayer, CounterApiState,
    CounterLimits, CounterService, PasswordService, RegistryConfig, TokenConfig, TokenService,
    UserRegistry,
};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tally_common::logging::init_logging("tally-server");

    info!("Starting Tally Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("TALLY_API_PORT", 8080);
    let jwt_secret = std::env::var("TALLY_JWT_SECRET")
        .context("TALLY_JWT_SECRET must be set; the signing secret is never embedded in source")?;
    let jwt_issuer = std::env::var("TALLY_JWT_ISSUER").ok();
    let token_expiry_secs = std::env::var("TALLY_TOKEN_EXPIRY_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok());

    // Initialize services; the registry is the single shared mutable resource
    let token_service = Arc::new(TokenService::new(TokenConfig {
        secret: jwt_secret,
        issuer: jwt_issuer,
        expiry_secs: token_expiry_secs,
        ..Default::default()
    }));
    let password_service = Arc::new(PasswordService::new(Argon2Config::default()));
    let registry = Arc::new(UserRegistry::new(
        password_service,
        token_service.clone(),
        RegistryConfig::default(),
    ));
    let counter_service = Arc::new(CounterService::new(registry.clone(), CounterLimits::default()));
    info!("Auth and counter services initialized");

    let app_state = AppState {
        token_service,
        registry: registry.clone(),
    };

    let auth_state = AuthApiState { registry };
    let counter_state = CounterApiState { counter_service };

    // Build API router with auto-collected OpenAPI paths
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/v1", auth_router(auth_state))
        .nest("/v1", counter_router(counter_state))
        .split_for_parts();

    openapi.info.title = "Tally API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description =
        Some("Token-authenticated bounded counter per registered user".to_string());

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    info!("Tally Server started");
    info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();

    info!("Tally Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
