//! Binding and decoding shared by the sqlx-backed executors.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use ll_core::sql::alias;
use ll_core::{BindValue, RawLogRecord, SqlStatement};
use sqlx::query::Query;
use sqlx::{ColumnIndex, Database, Decode, Encode, Row, Type};

pub(crate) fn bind_statement<'q, DB>(
    statement: &'q SqlStatement,
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    String: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    DateTime<Utc>: Encode<'q, DB> + Type<DB>,
{
    statement
        .bindings
        .iter()
        .fold(sqlx::query::<DB>(&statement.text), |query, value| match value {
            BindValue::Text(text) => query.bind(text.clone()),
            BindValue::Int(value) => query.bind(*value),
            BindValue::Timestamp(ts) => query.bind(*ts),
        })
}

pub(crate) fn decode_record<R>(row: &R, additional: &[String]) -> StoreResult<RawLogRecord>
where
    R: Row,
    for<'r> Option<String>: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> DateTime<Utc>: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> NaiveDateTime: Decode<'r, R::Database> + Type<R::Database>,
    for<'a> &'a str: ColumnIndex<R>,
{
    Ok(RawLogRecord {
        timestamp: decode_timestamp(row)?,
        level: row.try_get(alias::LEVEL)?,
        message: row.try_get(alias::MESSAGE)?,
        message_template: row.try_get(alias::MESSAGE_TEMPLATE)?,
        exception: row.try_get(alias::EXCEPTION)?,
        properties: row.try_get(alias::PROPERTIES)?,
        log_event: row.try_get(alias::LOG_EVENT)?,
        additional: additional
            .iter()
            .enumerate()
            .map(|(i, column)| -> StoreResult<(String, Option<String>)> {
                let value: Option<String> = row.try_get(alias::additional(i).as_str())?;
                Ok((column.clone(), value))
            })
            .collect::<StoreResult<_>>()?,
    })
}

/// Sinks write either zoned or naive timestamps; naive values are UTC.
fn decode_timestamp<R>(row: &R) -> StoreResult<DateTime<Utc>>
where
    R: Row,
    for<'r> DateTime<Utc>: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> NaiveDateTime: Decode<'r, R::Database> + Type<R::Database>,
    for<'a> &'a str: ColumnIndex<R>,
{
    match row.try_get::<DateTime<Utc>, _>(alias::TIMESTAMP) {
        Ok(ts) => Ok(ts),
        Err(sqlx::Error::ColumnDecode { .. }) => row
            .try_get::<NaiveDateTime, _>(alias::TIMESTAMP)
            .map(|ts| ts.and_utc())
            .map_err(|err| StoreError::Decode {
                column: alias::TIMESTAMP,
                reason: err.to_string(),
            }),
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn decode_count<R>(row: &R) -> StoreResult<u64>
where
    R: Row,
    for<'r> i64: Decode<'r, R::Database> + Type<R::Database>,
    usize: ColumnIndex<R>,
{
    let total: i64 = row.try_get(0usize)?;
    u64::try_from(total).map_err(|err| StoreError::Decode {
        column: alias::TOTAL,
        reason: err.to_string(),
    })
}
