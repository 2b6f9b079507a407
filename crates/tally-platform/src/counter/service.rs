//! Counter Service
//!
//! Bounds-checked operations on a principal's counter. The principal has
//! already been resolved by the request authenticator; mutation goes through
//! the registry's locked read-modify-write.

use std::sync::Arc;

use crate::auth::registry::UserRegistry;
use crate::shared::error::{Result, TallyError};

/// Counter bounds
#[derive(Debug, Clone)]
pub struct CounterLimits {
    pub min: i64,
    pub max: i64,
}

impl Default for CounterLimits {
    fn default() -> Self {
        Self {
            min: 1,
            max: 1_000_000_000_000,
        }
    }
}

pub struct CounterService {
    registry: Arc<UserRegistry>,
    limits: CounterLimits,
}

impl CounterService {
    pub fn new(registry: Arc<UserRegistry>, limits: CounterLimits) -> Self {
        Self { registry, limits }
    }

    /// Increment the principal's counter, returning the new value.
    ///
    /// Rejects when the incremented value is `>=` the maximum, so the
    /// maximum itself is never reachable by increment (it is reachable by
    /// `set`). This boundary is a compatibility contract; keep the `>=`.
    pub fn increment(&self, email: &str) -> Result<i64> {
        let max = self.limits.max;
        self.registry.update_counter(email, |current| {
            let next = current + 1;
            if next >= max {
                Err(TallyError::out_of_range(format!(
                    "Cannot increment number beyond max value {}. Reset your \
                     number to a lower value and try again.",
                    max
                )))
            } else {
                Ok(next)
            }
        })
    }

    /// Current counter value; pure read
    pub fn current(&self, email: &str) -> Result<i64> {
        self.registry
            .resolve(email)
            .map(|p| p.counter)
            .ok_or_else(|| TallyError::unauthorized("A valid token must be passed."))
    }

    /// Set the counter to a supplied raw value, returning the parsed value.
    ///
    /// Accepts a JSON string or integer; anything unparseable or outside
    /// the configured bounds is a validation error and leaves the stored
    /// value unchanged.
    pub fn set(&self, email: &str, raw: &serde_json::Value) -> Result<i64> {
        let value = self.parse_value(raw).ok_or_else(|| {
            TallyError::validation(format!(
                "Parameter 'current' must be a valid integer in range [{}, {}], but got {}.",
                self.limits.min, self.limits.max, raw
            ))
        })?;

        self.registry.update_counter(email, |_| Ok(value))
    }

    fn parse_value(&self, raw: &serde_json::Value) -> Option<i64> {
        let value = match raw {
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
            serde_json::Value::Number(n) => n.as_i64()?,
            _ => return None,
        };

        if value < self.limits.min || value > self.limits.max {
            return None;
        }
        Some(value)
    }
}
