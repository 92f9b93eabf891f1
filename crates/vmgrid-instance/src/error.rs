//! Error types for the instance gateway.

use thiserror::Error;
use vmgrid_catalog::CatalogError;

/// Result type alias for instance operations.
pub type InstanceResult<T> = Result<T, InstanceError>;

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other failure reported by a cloud API.
    #[error("cloud api error: {0}")]
    Api(String),

    #[error("offering selection failed: {0}")]
    Selection(#[from] CatalogError),

    #[error("invalid provider id: {0}")]
    InvalidProviderId(String),

    #[error("invalid requirement {key}={value}")]
    InvalidRequirement { key: String, value: String },
}

impl InstanceError {
    /// The resource is already gone; callers treat this as resolved.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
