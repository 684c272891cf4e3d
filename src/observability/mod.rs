//! Observability module providing structured logging.
//!
//! Log output is configured from `[observability.logging]` and can be
//! overridden at runtime with `RUST_LOG`.

#[cfg(feature = "server")]
mod tracing_init;

#[cfg(feature = "server")]
pub use tracing_init::*;
