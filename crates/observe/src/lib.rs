//! This crate is intended to contain code that is required to provide or
//! improve the observability of the proxy and calculator binaries. That
//! includes initialization logic for metrics and logging as well as the
//! shared logging arguments.
pub mod arguments;
pub mod config;
pub mod metrics;
pub mod tracing;

pub use config::Config;
