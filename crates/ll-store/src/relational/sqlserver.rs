//! SQL Server over tiberius.
//!
//! `Serilog.Sinks.MSSqlServer` stores properties as XML, with the JSON
//! `LogEvent` column as the optional secondary payload.

use super::{invalid_connection_string, RelationalOptions, RelationalProvider, SqlExecutor};
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use ll_core::sql::alias;
use ll_core::{
    BindValue, ColumnMapping, ConfigError, Dialect, LevelFormat, PropertyType, RawLogRecord,
    SqlStatement,
};
use tiberius::{Client, Config, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

pub struct SqlServerExecutor {
    config: Config,
}

impl SqlServerExecutor {
    /// Parses an ADO.NET connection string
    /// (`Server=tcp:host,1433;Database=Logs;User Id=…;Password=…`).
    pub fn new(connection_string: &str) -> Result<Self, ConfigError> {
        let config = Config::from_ado_string(connection_string).map_err(invalid_connection_string)?;
        Ok(Self { config })
    }

    async fn connect(&self) -> StoreResult<Client<Compat<TcpStream>>> {
        let tcp = TcpStream::connect(self.config.get_addr()).await?;
        tcp.set_nodelay(true)?;
        let client = Client::connect(self.config.clone(), tcp.compat_write()).await?;
        Ok(client)
    }
}

fn query_for(statement: &SqlStatement) -> Query<'_> {
    let mut query = Query::new(statement.text.as_str());
    for value in &statement.bindings {
        match value {
            BindValue::Text(text) => query.bind(text.as_str()),
            BindValue::Int(value) => query.bind(*value),
            BindValue::Timestamp(ts) => query.bind(ts.naive_utc()),
        }
    }
    query
}

fn text(row: &Row, column: &str) -> StoreResult<Option<String>> {
    Ok(row.try_get::<&str, _>(column)?.map(str::to_string))
}

/// `datetime`/`datetime2` columns hold naive UTC; `datetimeoffset` is zoned.
fn timestamp(row: &Row) -> StoreResult<DateTime<Utc>> {
    let value = match row.try_get::<NaiveDateTime, _>(alias::TIMESTAMP) {
        Ok(naive) => naive.map(|ts| ts.and_utc()),
        Err(_) => row.try_get::<DateTime<Utc>, _>(alias::TIMESTAMP)?,
    };
    value.ok_or_else(|| StoreError::Decode {
        column: alias::TIMESTAMP,
        reason: "timestamp is NULL".into(),
    })
}

fn decode_record(row: &Row, additional: &[String]) -> StoreResult<RawLogRecord> {
    Ok(RawLogRecord {
        timestamp: timestamp(row)?,
        level: text(row, alias::LEVEL)?,
        message: text(row, alias::MESSAGE)?,
        message_template: text(row, alias::MESSAGE_TEMPLATE)?,
        exception: text(row, alias::EXCEPTION)?,
        properties: text(row, alias::PROPERTIES)?,
        log_event: text(row, alias::LOG_EVENT)?,
        additional: additional
            .iter()
            .enumerate()
            .map(|(i, column)| -> StoreResult<(String, Option<String>)> {
                Ok((column.clone(), text(row, &alias::additional(i))?))
            })
            .collect::<StoreResult<_>>()?,
    })
}

#[async_trait::async_trait]
impl SqlExecutor for SqlServerExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn properties_type(&self) -> PropertyType {
        PropertyType::Xml
    }

    async fn fetch_rows(
        &self,
        statement: &SqlStatement,
        additional: &[String],
    ) -> StoreResult<Vec<RawLogRecord>> {
        let mut client = self.connect().await?;
        let rows = query_for(statement)
            .query(&mut client)
            .await?
            .into_first_result()
            .await?;
        client.close().await?;
        rows.iter().map(|row| decode_record(row, additional)).collect()
    }

    async fn fetch_count(&self, statement: &SqlStatement) -> StoreResult<u64> {
        let mut client = self.connect().await?;
        let row = query_for(statement)
            .query(&mut client)
            .await?
            .into_row()
            .await?;
        client.close().await?;

        let total = match row {
            Some(row) => row.try_get::<i64, _>(0)?.unwrap_or_default(),
            None => 0,
        };
        u64::try_from(total).map_err(|err| StoreError::Decode {
            column: alias::TOTAL,
            reason: err.to_string(),
        })
    }
}

pub type SqlServerProvider = RelationalProvider<SqlServerExecutor>;

impl RelationalProvider<SqlServerExecutor> {
    pub fn new(options: RelationalOptions) -> Result<Self, ConfigError> {
        let executor = SqlServerExecutor::new(options.connection_string()?)?;
        let queries = options.query_builder(
            Dialect::SqlServer,
            ColumnMapping::sql_server(),
            LevelFormat::Name,
        )?;
        let name = options.provider_name(|| {
            format!(
                "MSSQL.{}.{}",
                queries.table().schema().unwrap_or_default(),
                queries.table().name()
            )
        });
        Ok(Self::with_executor(name, queries, executor))
    }
}
