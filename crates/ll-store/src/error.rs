use ll_core::ConfigError;
use thiserror::Error;

/// Failure of a provider call. Driver errors pass through unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    #[cfg(feature = "sqlserver")]
    #[error(transparent)]
    SqlServer(#[from] tiberius::error::Error),

    #[cfg(feature = "mongo")]
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot decode `{column}`: {reason}")]
    Decode { column: &'static str, reason: String },

    #[error("search was cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
