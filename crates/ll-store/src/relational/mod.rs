//! # Relational Providers
//!
//! One provider for every SQL sink. [`RelationalProvider`] owns the query
//! builder and the orchestration; the backend-specific part is a
//! [`SqlExecutor`] that opens a connection, binds a [`SqlStatement`] and
//! decodes rows into [`RawLogRecord`]s.

pub mod mysql;
pub mod postgres;
pub mod sqlite;
#[cfg(feature = "sqlserver")]
pub mod sqlserver;

mod rows;

pub use mysql::{MySqlExecutor, MySqlProvider};
pub use postgres::{PostgresExecutor, PostgresProvider, PostgresSink};
pub use sqlite::{SqliteExecutor, SqliteProvider};
#[cfg(feature = "sqlserver")]
pub use sqlserver::{SqlServerExecutor, SqlServerProvider};

use crate::aggregate;
use crate::error::StoreResult;
use crate::provider::DataProvider;
use ll_core::{
    ColumnMapping, ColumnOverrides, ConfigError, Dialect, LevelFormat, PropertyType,
    QueryParameters, RawLogRecord, ResultPage, SqlQueryBuilder, SqlStatement, TableIdentity,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

// =============================================================================
// Executor Seam
// =============================================================================

/// Runs generated statements against one SQL backend.
#[async_trait::async_trait]
pub trait SqlExecutor: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Encoding of the sink's primary properties column.
    fn properties_type(&self) -> PropertyType {
        PropertyType::Json
    }

    /// Run `statement` and decode each row. `additional` names the
    /// configured extra columns, selected in order under
    /// [`alias::additional`](ll_core::sql::alias::additional).
    async fn fetch_rows(
        &self,
        statement: &SqlStatement,
        additional: &[String],
    ) -> StoreResult<Vec<RawLogRecord>>;

    async fn fetch_count(&self, statement: &SqlStatement) -> StoreResult<u64>;
}

/// Settings shared by every relational provider.
#[derive(Debug, Clone, Default)]
pub struct RelationalOptions {
    pub connection_string: String,
    /// Overrides the default `<backend>.<schema>.<table>` name.
    pub name: Option<String>,
    /// Falls back to the dialect's default schema when absent.
    pub schema: Option<String>,
    pub table: String,
    pub columns: ColumnOverrides,
}

impl RelationalOptions {
    pub fn new(connection_string: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            table: table.into(),
            ..Default::default()
        }
    }

    pub(crate) fn connection_string(&self) -> Result<&str, ConfigError> {
        let value = self.connection_string.trim();
        if value.is_empty() {
            return Err(ConfigError::Missing {
                field: "connection_string",
            });
        }
        Ok(value)
    }

    /// Validate identity and columns against `preset` for `dialect`.
    pub(crate) fn query_builder(
        &self,
        dialect: Dialect,
        preset: ColumnMapping,
        level_format: LevelFormat,
    ) -> Result<SqlQueryBuilder, ConfigError> {
        let schema = self
            .schema
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(dialect.default_schema());
        let table = TableIdentity::new(schema, &self.table)?;
        let columns = preset.with_overrides(&self.columns)?;
        Ok(SqlQueryBuilder::new(dialect, table, columns, level_format))
    }

    pub(crate) fn provider_name(&self, default: impl FnOnce() -> String) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default(),
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

pub struct RelationalProvider<E> {
    name: String,
    queries: SqlQueryBuilder,
    executor: E,
}

impl<E: SqlExecutor> RelationalProvider<E> {
    pub fn with_executor(name: impl Into<String>, queries: SqlQueryBuilder, executor: E) -> Self {
        Self {
            name: name.into(),
            queries,
            executor,
        }
    }

    pub fn queries(&self) -> &SqlQueryBuilder {
        &self.queries
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[async_trait::async_trait]
impl<E: SqlExecutor> DataProvider for RelationalProvider<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_data(
        &self,
        params: &QueryParameters,
        cancel: &CancellationToken,
    ) -> StoreResult<ResultPage> {
        let fetch = self.queries.fetch(params);
        let count = self.queries.count(params);
        debug!(provider = %self.name, sql = %fetch.text, "fetch statement");
        debug!(provider = %self.name, sql = %count.text, "count statement");

        aggregate::join_page(
            params,
            cancel,
            self.executor.properties_type(),
            self.executor
                .fetch_rows(&fetch, self.queries.columns().additional()),
            self.executor.fetch_count(&count),
        )
        .await
    }
}

fn invalid_connection_string(err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidConnectionString {
        reason: err.to_string(),
    }
}
