//! Error types shared by every LogLens crate.

use thiserror::Error;

/// A provider or host was configured with missing or unusable settings.
///
/// Raised while building a provider, never while running a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{field}`")]
    Missing { field: &'static str },

    #[error("`{value}` is not a valid identifier for `{field}`")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("invalid connection string: {reason}")]
    InvalidConnectionString { reason: String },

    #[error("a provider named `{name}` is already registered")]
    DuplicateProvider { name: String },
}

/// A search request that cannot be turned into [`crate::QueryParameters`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("page must be 1 or greater")]
    ZeroPage,

    #[error("page size must be 1 or greater")]
    ZeroPageSize,

    #[error("page {page} with page size {page_size} is out of range")]
    OffsetOverflow { page: u32, page_size: u32 },

    #[error("`{value}` is not a valid timestamp for `{field}`")]
    InvalidDate { field: &'static str, value: String },
}
