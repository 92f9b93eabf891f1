//! Catalog error types.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while reading or selecting from the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Nothing in the catalog is available and satisfies the constraints.
    /// This usually means "no capacity right now", not a malformed catalog.
    #[error("no offering available: {0}")]
    NoOfferingAvailable(String),

    #[error("catalog source error: {0}")]
    Source(String),

    #[error("catalog parse error: {0}")]
    Parse(String),
}
