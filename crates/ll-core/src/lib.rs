//! # ll-core: The Model of LogLens
//!
//! Everything a log search needs before it touches a backend: the
//! normalized request ([`QueryParameters`]), the column layout of a sink
//! ([`ColumnMapping`]), level normalization, the AND-composed filter and
//! the per-dialect SQL builders.
//!
//! Nothing in this crate performs I/O. Backend crates turn the statements
//! and filters built here into queries against a live store.

pub mod columns;
pub mod entry;
pub mod error;
pub mod filter;
pub mod level;
pub mod params;
pub mod sql;

pub use columns::{ColumnMapping, ColumnOverrides, TableIdentity};
pub use entry::{LogEntry, PropertyType, RawLogRecord, ResultPage};
pub use error::{ConfigError, ParamError};
pub use filter::{Filter, Predicate};
pub use level::{LevelFilter, LevelFormat, LevelValue, LogLevel};
pub use params::{QueryParameters, QueryParametersBuilder};
pub use sql::{build_count_query, build_fetch_query, BindValue, Dialect, SqlQueryBuilder, SqlStatement};
