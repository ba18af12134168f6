//! SQLite over sqlx. Databases are opened read-only.

use super::rows::{bind_statement, decode_count, decode_record};
use super::{invalid_connection_string, RelationalOptions, RelationalProvider, SqlExecutor};
use crate::error::StoreResult;
use ll_core::{ColumnMapping, ConfigError, Dialect, LevelFormat, RawLogRecord, SqlStatement};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::str::FromStr;

pub struct SqliteExecutor {
    options: SqliteConnectOptions,
}

impl SqliteExecutor {
    /// Accepts a sqlx URL (`sqlite://logs.db`), a bare path, or an
    /// ADO-style `Data Source=logs.db` string.
    pub fn new(connection_string: &str) -> Result<Self, ConfigError> {
        let location = data_source(connection_string).unwrap_or(connection_string);
        let options = SqliteConnectOptions::from_str(location)
            .map_err(invalid_connection_string)?
            .read_only(true);
        Ok(Self { options })
    }
}

fn data_source(connection_string: &str) -> Option<&str> {
    connection_string.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        let key = key.trim();
        (key.eq_ignore_ascii_case("data source") || key.eq_ignore_ascii_case("datasource"))
            .then(|| value.trim())
    })
}

#[async_trait::async_trait]
impl SqlExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_rows(
        &self,
        statement: &SqlStatement,
        additional: &[String],
    ) -> StoreResult<Vec<RawLogRecord>> {
        let mut conn = SqliteConnection::connect_with(&self.options).await?;
        let rows = bind_statement(statement).fetch_all(&mut conn).await?;
        conn.close().await?;
        rows.iter().map(|row| decode_record(row, additional)).collect()
    }

    async fn fetch_count(&self, statement: &SqlStatement) -> StoreResult<u64> {
        let mut conn = SqliteConnection::connect_with(&self.options).await?;
        let row = bind_statement(statement).fetch_one(&mut conn).await?;
        conn.close().await?;
        decode_count(&row)
    }
}

pub type SqliteProvider = RelationalProvider<SqliteExecutor>;

impl RelationalProvider<SqliteExecutor> {
    pub fn new(options: RelationalOptions) -> Result<Self, ConfigError> {
        let executor = SqliteExecutor::new(options.connection_string()?)?;
        let queries =
            options.query_builder(Dialect::Sqlite, ColumnMapping::sqlite(), LevelFormat::Name)?;
        let name = options.provider_name(|| format!("SQLite.{}", queries.table().name()));
        Ok(Self::with_executor(name, queries, executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_source_is_extracted() {
        assert_eq!(data_source("Data Source=logs.db;Cache=Shared"), Some("logs.db"));
        assert_eq!(data_source("datasource = /var/log/app.db"), Some("/var/log/app.db"));
        assert_eq!(data_source("sqlite://logs.db"), None);
    }

    #[test]
    fn test_accepts_each_connection_string_style() {
        for cs in ["sqlite://logs.db", "logs.db", "Data Source=logs.db"] {
            assert!(SqliteExecutor::new(cs).is_ok(), "{}", cs);
        }
    }
}
