//! Domain layer for the planner janitor
//!
//! This module contains core models, errors and the port traits the services
//! are written against.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
