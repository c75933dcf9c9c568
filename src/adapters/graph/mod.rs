//! Microsoft Graph adapter.
//!
//! [`GraphClient`] implements the directory, mailbox and task-store ports
//! against Graph v1.0, authenticating through a [`TokenProvider`].

pub mod auth;
pub mod client;
pub mod errors;
pub mod models;

pub use auth::TokenProvider;
pub use client::GraphClient;
pub use errors::{AuthError, GraphError};
