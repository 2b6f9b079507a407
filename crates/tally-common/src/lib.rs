//! Shared infrastructure for the Tally services.
//!
//! Currently this is just the logging bootstrap; anything needed by both the
//! platform crate and the server binaries lives here.

pub mod logging;
