//! PostgreSQL over sqlx.
//!
//! Two sink layouts are supported. `Serilog.Sinks.PostgreSQL` writes
//! lowercase snake_case columns and stores the level as its integer
//! severity; `Serilog.Sinks.Postgresql.Alternative` writes PascalCase
//! columns and the level name.

use super::rows::{bind_statement, decode_count, decode_record};
use super::{invalid_connection_string, RelationalOptions, RelationalProvider, SqlExecutor};
use crate::error::StoreResult;
use ll_core::{ColumnMapping, ConfigError, Dialect, LevelFormat, RawLogRecord, SqlStatement};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostgresSink {
    #[default]
    PostgreSql,
    Alternative,
}

impl PostgresSink {
    fn layout(self) -> (ColumnMapping, LevelFormat) {
        match self {
            Self::PostgreSql => (ColumnMapping::postgres(), LevelFormat::Code),
            Self::Alternative => (ColumnMapping::postgres_alternative(), LevelFormat::Name),
        }
    }
}

pub struct PostgresExecutor {
    options: PgConnectOptions,
}

impl PostgresExecutor {
    pub fn new(connection_string: &str) -> Result<Self, ConfigError> {
        let options =
            PgConnectOptions::from_str(connection_string).map_err(invalid_connection_string)?;
        Ok(Self { options })
    }
}

#[async_trait::async_trait]
impl SqlExecutor for PostgresExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_rows(
        &self,
        statement: &SqlStatement,
        additional: &[String],
    ) -> StoreResult<Vec<RawLogRecord>> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        let rows = bind_statement(statement).fetch_all(&mut conn).await?;
        conn.close().await?;
        rows.iter().map(|row| decode_record(row, additional)).collect()
    }

    async fn fetch_count(&self, statement: &SqlStatement) -> StoreResult<u64> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        let row = bind_statement(statement).fetch_one(&mut conn).await?;
        conn.close().await?;
        decode_count(&row)
    }
}

pub type PostgresProvider = RelationalProvider<PostgresExecutor>;

impl RelationalProvider<PostgresExecutor> {
    pub fn new(options: RelationalOptions, sink: PostgresSink) -> Result<Self, ConfigError> {
        let executor = PostgresExecutor::new(options.connection_string()?)?;
        let (preset, level_format) = sink.layout();
        let queries = options.query_builder(Dialect::Postgres, preset, level_format)?;
        let name = options.provider_name(|| {
            format!(
                "NPGSQL.{}.{}",
                queries.table().schema().unwrap_or_default(),
                queries.table().name()
            )
        });
        Ok(Self::with_executor(name, queries, executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DataProvider;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_name_includes_schema() {
        let options = RelationalOptions::new("postgres://loglens@localhost/logs", "logs");
        let provider = PostgresProvider::new(options, PostgresSink::PostgreSql).unwrap();
        assert_eq!(provider.name(), "NPGSQL.public.logs");
        assert_eq!(provider.queries().level_format(), LevelFormat::Code);
    }

    #[test]
    fn test_alternative_sink_uses_level_names() {
        let mut options = RelationalOptions::new("postgres://localhost/logs", "Logs");
        options.schema = Some("audit".into());
        let provider = PostgresProvider::new(options, PostgresSink::Alternative).unwrap();
        assert_eq!(provider.name(), "NPGSQL.audit.Logs");
        assert_eq!(provider.queries().columns().message(), "Message");
        assert_eq!(provider.queries().level_format(), LevelFormat::Name);
    }

    #[test]
    fn test_blank_connection_string_fails_construction() {
        let err = PostgresProvider::new(RelationalOptions::new("", "logs"), PostgresSink::default())
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigError::Missing {
                field: "connection_string"
            }
        );
    }

    #[test]
    fn test_malformed_connection_string_fails_construction() {
        let err = PostgresProvider::new(
            RelationalOptions::new("postgres://localhost:notaport/logs", "logs"),
            PostgresSink::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidConnectionString { .. }));
    }
}
