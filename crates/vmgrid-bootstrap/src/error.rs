//! Bootstrap error types.

use thiserror::Error;

/// Result type alias for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Errors that can occur while synthesizing or rendering bootstrap data.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A computed input with no default was left empty.
    #[error("missing required bootstrap input: {field}")]
    MissingRequiredInput { field: &'static str },

    /// The template referenced something the record could not provide.
    /// Given a synthesized record this indicates a synthesis bug.
    #[error("bootstrap template expansion failed: {0}")]
    TemplateExpansion(#[from] askama::Error),
}
