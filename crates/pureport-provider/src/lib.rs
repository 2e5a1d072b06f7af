//! # Pureport Provider
//!
//! Declarative resource kinds for the Pureport provisioning API, built on
//! [`reconcile_framework`]:
//!
//! - **[model]**: the nested JSON objects the API exchanges.
//! - **[resources]**: schemas and mappers for accounts, networks and the
//!   cloud connection subtypes.
//! - **[simulation]**: in-memory API collections used by [`session`].
//! - **[config]**: TOML configuration with an environment override.

pub mod config;
pub mod error;
pub mod model;
pub mod resources;
pub mod session;
pub mod simulation;

pub use config::{ConfigError, ProviderConfig};
pub use error::ProviderError;
pub use session::Session;
