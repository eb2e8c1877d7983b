//! Structured logging for the cart services.
//!
//! This crate provides:
//! - `LogConfig` - level, format and filter settings
//! - `Telemetry` - an owned `tracing` dispatch built from a `LogConfig`
//! - `Logger` - a cloneable per-component handle passed into constructors
//!
//! Nothing here installs a global subscriber. Each component logs into the
//! dispatch it was handed, so two stores in one process can log to two
//! different sinks, and tests can pass `Logger::disabled()`.

mod logging;

pub use logging::*;
