//! Process-wide logging setup shared by the counter binary and tests.

/// Tracing subscriber configuration.
pub mod tracing;

pub use crate::tracing::{LogFormat, init};
