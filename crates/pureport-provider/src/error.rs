use crate::config::ConfigError;
use reconcile_framework::{FieldError, ReconcileError, TransportError};
use thiserror::Error as ThisError;

/// Top-level error of the provider binary and session.
#[derive(Debug, ThisError)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The simulated API could not be reached while seeding or injecting.
    #[error("simulated API unavailable: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid {kind} configuration: {source}")]
    InvalidRecord {
        kind: &'static str,
        #[source]
        source: FieldError,
    },

    #[error("{kind} record has no identifier after {step}")]
    Unresolved { kind: &'static str, step: &'static str },
}
