//! MySQL / MariaDB over sqlx. The connection's database is the schema, so
//! tables are never qualified.

use super::rows::{bind_statement, decode_count, decode_record};
use super::{invalid_connection_string, RelationalOptions, RelationalProvider, SqlExecutor};
use crate::error::StoreResult;
use ll_core::{ColumnMapping, ConfigError, Dialect, LevelFormat, RawLogRecord, SqlStatement};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use std::str::FromStr;

pub struct MySqlExecutor {
    options: MySqlConnectOptions,
}

impl MySqlExecutor {
    pub fn new(connection_string: &str) -> Result<Self, ConfigError> {
        let options =
            MySqlConnectOptions::from_str(connection_string).map_err(invalid_connection_string)?;
        Ok(Self { options })
    }
}

#[async_trait::async_trait]
impl SqlExecutor for MySqlExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn fetch_rows(
        &self,
        statement: &SqlStatement,
        additional: &[String],
    ) -> StoreResult<Vec<RawLogRecord>> {
        let mut conn = MySqlConnection::connect_with(&self.options).await?;
        let rows = bind_statement(statement).fetch_all(&mut conn).await?;
        conn.close().await?;
        rows.iter().map(|row| decode_record(row, additional)).collect()
    }

    async fn fetch_count(&self, statement: &SqlStatement) -> StoreResult<u64> {
        let mut conn = MySqlConnection::connect_with(&self.options).await?;
        let row = bind_statement(statement).fetch_one(&mut conn).await?;
        conn.close().await?;
        decode_count(&row)
    }
}

pub type MySqlProvider = RelationalProvider<MySqlExecutor>;

impl RelationalProvider<MySqlExecutor> {
    pub fn new(options: RelationalOptions) -> Result<Self, ConfigError> {
        let executor = MySqlExecutor::new(options.connection_string()?)?;
        let queries =
            options.query_builder(Dialect::MySql, ColumnMapping::mysql(), LevelFormat::Name)?;
        let name = options.provider_name(|| format!("MySQL.{}", queries.table().name()));
        Ok(Self::with_executor(name, queries, executor))
    }
}
