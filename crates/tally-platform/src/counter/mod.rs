//! Counter Aggregate
//!
//! Bounds-checked counter operations and their endpoints.

pub mod service;
pub mod counter_api;

pub use service::{CounterLimits, CounterService};
pub use counter_api::{counter_router, CounterApiState};
