//! Infrastructure layer module
//!
//! - Configuration management (figment layering and validation)
//! - Logging infrastructure (tracing subscriber, rolling files, secret scrubbing)

pub mod config;
pub mod logging;
