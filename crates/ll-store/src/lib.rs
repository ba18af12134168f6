//! # ll-store: The Stores of LogLens
//!
//! Every backend that can answer a log search implements [`DataProvider`].
//! Relational sinks share one [`RelationalProvider`] and differ only in the
//! [`SqlExecutor`] that talks to the driver; MongoDB has its own provider
//! that renders the same filter as a BSON document.
//!
//! Each search fans out into a page fetch and a count, joined by
//! [`aggregate::join_page`]. Either failing fails the search; cancelling
//! the token drops both.
//!
//! ## Lifecycle
//!
//! - SQL connections are opened per sub-fetch and closed before it returns.
//! - The MongoDB `Client` is created once per URI and shared by every
//!   provider that uses it.

pub mod aggregate;
pub mod error;
pub mod provider;
pub mod relational;

#[cfg(feature = "mongo")]
pub mod mongo;

pub use error::{StoreError, StoreResult};
pub use provider::DataProvider;
pub use relational::{
    MySqlProvider, PostgresProvider, PostgresSink, RelationalOptions, RelationalProvider,
    SqlExecutor, SqliteProvider,
};

#[cfg(feature = "sqlserver")]
pub use relational::SqlServerProvider;

#[cfg(feature = "mongo")]
pub use mongo::{MongoOptions, MongoProvider, SearchMode};

pub use tokio_util::sync::CancellationToken;
