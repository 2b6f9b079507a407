//! Shared Infrastructure

pub mod error;
pub mod middleware;
