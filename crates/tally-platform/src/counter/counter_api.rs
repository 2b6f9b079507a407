//! Counter API Endpoints
//!
//! Authenticated endpoints operating on the caller's counter:
//! - GET /v1/next - Increment and return the new value
//! - GET /v1/current - Return the current value
//! - POST /v1/current - Set the value

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::counter::service::CounterService;
use crate::shared::error::TallyError;
use crate::shared::middleware::Authenticated;

/// Counter value response
#[derive(Debug, Serialize, ToSchema)]
pub struct IntegerResponse {
    /// The counter value
    pub integer: i64,
}

/// Set-counter request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCounterRequest {
    /// The new value; a JSON string or integer
    #[serde(default)]
    #[schema(value_type = Object)]
    pub current: serde_json::Value,
}

/// Counter endpoints state
#[derive(Clone)]
pub struct CounterApiState {
    pub counter_service: Arc<CounterService>,
}

/// Increment the caller's counter
///
/// Returns the incremented value, or a 400 when the result would reach the
/// configured maximum.
#[utoipa::path(
    get,
    path = "/next",
    tag = "counter",
    operation_id = "getNext",
    responses(
        (status = 200, description = "Incremented value", body = IntegerResponse),
        (status = 400, description = "Counter would exceed the maximum"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn next(
    State(state): State<CounterApiState>,
    auth: Authenticated,
) -> Result<Json<IntegerResponse>, TallyError> {
    let integer = state.counter_service.increment(&auth.email)?;
    Ok(Json(IntegerResponse { integer }))
}

/// Get the caller's current counter value
#[utoipa::path(
    get,
    path = "/current",
    tag = "counter",
    operation_id = "getCurrent",
    responses(
        (status = 200, description = "Current value", body = IntegerResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn current(
    State(state): State<CounterApiState>,
    auth: Authenticated,
) -> Result<Json<IntegerResponse>, TallyError> {
    let integer = state.counter_service.current(&auth.email)?;
    Ok(Json(IntegerResponse { integer }))
}

/// Set the caller's counter value
///
/// Value-less update: returns an empty JSON object on success.
#[utoipa::path(
    post,
    path = "/current",
    tag = "counter",
    operation_id = "postCurrent",
    request_body = SetCounterRequest,
    responses(
        (status = 200, description = "Value updated"),
        (status = 400, description = "Value not an integer or out of range"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn set_current(
    State(state): State<CounterApiState>,
    auth: Authenticated,
    Json(req): Json<SetCounterRequest>,
) -> Result<Json<serde_json::Value>, TallyError> {
    state.counter_service.set(&auth.email, &req.current)?;
    Ok(Json(serde_json::json!({})))
}

pub fn counter_router(state: CounterApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(next))
        .routes(routes!(current, set_current))
        .with_state(state)
}
