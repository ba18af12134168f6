//! # SQL Query Builder
//!
//! Renders a [`Filter`] plus pagination into parameterized SQL for each
//! relational dialect. Filter values are always bound; only validated
//! identifiers from the [`ColumnMapping`] are interpolated.
//!
//! Every provider issues two statements per request:
//!
//! - **fetch**: the mapped columns, newest first, one page.
//! - **count**: the size of the whole filtered result.
//!
//! Both render the same WHERE clause from the same parameters, so the page
//! is always a window onto the counted set.

mod dialect;

pub use dialect::{Dialect, LIKE_ESCAPE};

use crate::columns::{ColumnMapping, TableIdentity};
use crate::filter::{self, Filter, Predicate};
use crate::level::{LevelFormat, LevelValue};
use crate::params::QueryParameters;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Canonical result aliases, in select order. Executors read fetched rows
/// by these names.
pub mod alias {
    pub const MESSAGE: &str = "message";
    pub const MESSAGE_TEMPLATE: &str = "message_template";
    pub const LEVEL: &str = "level";
    pub const TIMESTAMP: &str = "timestamp";
    pub const EXCEPTION: &str = "exception";
    pub const PROPERTIES: &str = "properties";
    pub const LOG_EVENT: &str = "log_event";
    pub const TOTAL: &str = "total";

    /// Alias of the configured extra column at `index`.
    pub fn additional(index: usize) -> String {
        format!("extra_{}", index)
    }
}

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "'{}'", text),
            Self::Int(value) => write!(f, "{}", value),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// Statement text plus its bindings in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub text: String,
    pub bindings: Vec<BindValue>,
}

// ============================================================================
// Statement Builder
// ============================================================================

/// Appends SQL text and numbers placeholders in the dialect's style.
struct SqlBuilder {
    dialect: Dialect,
    text: String,
    bindings: Vec<BindValue>,
}

impl SqlBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            text: String::with_capacity(256),
            bindings: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) -> &mut Self {
        self.text.push_str(sql);
        self
    }

    fn push_bind(&mut self, value: BindValue) -> &mut Self {
        self.bindings.push(value);
        let placeholder = self.dialect.placeholder(self.bindings.len());
        self.text.push_str(&placeholder);
        self
    }

    fn finish(self) -> SqlStatement {
        SqlStatement {
            text: self.text,
            bindings: self.bindings,
        }
    }
}

// ============================================================================
// Query Builder
// ============================================================================

/// Builds fetch and count statements for one configured table.
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    dialect: Dialect,
    table: TableIdentity,
    columns: ColumnMapping,
    level_format: LevelFormat,
}

impl SqlQueryBuilder {
    pub fn new(
        dialect: Dialect,
        table: TableIdentity,
        columns: ColumnMapping,
        level_format: LevelFormat,
    ) -> Self {
        Self {
            dialect,
            table,
            columns,
            level_format,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table(&self) -> &TableIdentity {
        &self.table
    }

    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    pub fn level_format(&self) -> LevelFormat {
        self.level_format
    }

    pub fn filter(&self, params: &QueryParameters) -> Filter {
        filter::build(params, self.level_format)
    }

    pub fn fetch(&self, params: &QueryParameters) -> SqlStatement {
        build_fetch_query(&self.columns, &self.table, self.dialect, params, self.level_format)
    }

    pub fn count(&self, params: &QueryParameters) -> SqlStatement {
        build_count_query(&self.columns, &self.table, self.dialect, params, self.level_format)
    }
}

/// One page of matching rows, most recent first.
pub fn build_fetch_query(
    columns: &ColumnMapping,
    table: &TableIdentity,
    dialect: Dialect,
    params: &QueryParameters,
    format: LevelFormat,
) -> SqlStatement {
    let assembly = Assembly {
        dialect,
        table,
        columns,
    };
    let mut sql = SqlBuilder::new(dialect);

    sql.push("SELECT ");
    sql.push(&assembly.select_list());
    sql.push(" FROM ");
    sql.push(&dialect.qualified_table(table));
    assembly.push_where(&mut sql, &filter::build(params, format));
    sql.push(" ORDER BY ");
    if dialect.compares_julian_days() {
        sql.push(&format!("julianday({})", dialect.quote(columns.timestamp())));
    } else {
        sql.push(&dialect.quote(columns.timestamp()));
    }
    sql.push(" DESC");

    match dialect {
        Dialect::SqlServer => {
            sql.push(" OFFSET ");
            sql.push_bind(BindValue::Int(params.offset()));
            sql.push(" ROWS FETCH NEXT ");
            sql.push_bind(BindValue::Int(params.limit()));
            sql.push(" ROWS ONLY");
        }
        _ => {
            sql.push(" LIMIT ");
            sql.push_bind(BindValue::Int(params.limit()));
            sql.push(" OFFSET ");
            sql.push_bind(BindValue::Int(params.offset()));
        }
    }
    sql.finish()
}

/// Number of rows matching the filter, ignoring pagination.
pub fn build_count_query(
    columns: &ColumnMapping,
    table: &TableIdentity,
    dialect: Dialect,
    params: &QueryParameters,
    format: LevelFormat,
) -> SqlStatement {
    let assembly = Assembly {
        dialect,
        table,
        columns,
    };
    let mut sql = SqlBuilder::new(dialect);

    sql.push("SELECT ");
    sql.push(dialect.count_all());
    sql.push(" AS ");
    sql.push(&dialect.quote(alias::TOTAL));
    sql.push(" FROM ");
    sql.push(&dialect.qualified_table(assembly.table));
    assembly.push_where(&mut sql, &filter::build(params, format));
    sql.finish()
}

/// Dialect-parameterized rendering shared by fetch and count.
struct Assembly<'a> {
    dialect: Dialect,
    table: &'a TableIdentity,
    columns: &'a ColumnMapping,
}

impl Assembly<'_> {
    fn select_list(&self) -> String {
        let d = self.dialect;
        let c = self.columns;
        let text_column = |column: Option<&str>, name: &str| {
            let expr = match column {
                Some(column) => d.text(&d.quote(column)),
                None => d.text("NULL"),
            };
            format!("{} AS {}", expr, d.quote(name))
        };

        let mut list = vec![
            text_column(Some(c.message()), alias::MESSAGE),
            text_column(c.message_template(), alias::MESSAGE_TEMPLATE),
            text_column(Some(c.level()), alias::LEVEL),
            format!("{} AS {}", d.quote(c.timestamp()), d.quote(alias::TIMESTAMP)),
            text_column(Some(c.exception()), alias::EXCEPTION),
            text_column(Some(c.properties()), alias::PROPERTIES),
            text_column(c.log_event(), alias::LOG_EVENT),
        ];
        for (i, column) in c.additional().iter().enumerate() {
            list.push(text_column(Some(column), &alias::additional(i)));
        }
        list.join(", ")
    }

    fn push_where(&self, sql: &mut SqlBuilder, filter: &Filter) {
        for (i, predicate) in filter.predicates().iter().enumerate() {
            sql.push(if i == 0 { " WHERE " } else { " AND " });
            self.push_predicate(sql, predicate);
        }
    }

    fn push_predicate(&self, sql: &mut SqlBuilder, predicate: &Predicate) {
        let d = self.dialect;
        match predicate {
            Predicate::LevelEquals(value) => {
                sql.push(&d.quote(self.columns.level()));
                sql.push(" = ");
                sql.push_bind(match value {
                    LevelValue::Name(name) => BindValue::Text((*name).to_string()),
                    LevelValue::Code(code) => BindValue::Int(*code),
                });
            }
            Predicate::TextContains(text) => {
                let pattern = format!("%{}%", d.escape_like(text));
                sql.push("(");
                self.push_like(sql, self.columns.message(), &pattern);
                sql.push(" OR ");
                self.push_like(sql, self.columns.exception(), &pattern);
                sql.push(")");
            }
            Predicate::TimestampAtOrAfter(ts) => self.push_timestamp(sql, ">=", *ts),
            Predicate::TimestampBefore(ts) => self.push_timestamp(sql, "<", *ts),
            Predicate::Never => {
                sql.push("1 = 0");
            }
        }
    }

    fn push_like(&self, sql: &mut SqlBuilder, column: &str, pattern: &str) {
        let d = self.dialect;
        if d.has_ilike() {
            sql.push(&d.quote(column));
            sql.push(" ILIKE ");
        } else {
            sql.push("LOWER(");
            sql.push(&d.quote(column));
            sql.push(") LIKE LOWER(");
        }
        sql.push_bind(BindValue::Text(pattern.to_string()));
        if !d.has_ilike() {
            sql.push(")");
        }
        sql.push(&format!(" ESCAPE '{}'", LIKE_ESCAPE));
    }

    fn push_timestamp(&self, sql: &mut SqlBuilder, op: &str, ts: DateTime<Utc>) {
        let d = self.dialect;
        let column = d.quote(self.columns.timestamp());
        if d.compares_julian_days() {
            sql.push(&format!("julianday({}) {} julianday(", column, op));
            sql.push_bind(BindValue::Timestamp(ts));
            sql.push(")");
        } else {
            sql.push(&format!("{} {} ", column, op));
            sql.push_bind(BindValue::Timestamp(ts));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn builder(dialect: Dialect, schema: Option<&str>, table: &str, columns: ColumnMapping) -> SqlQueryBuilder {
        SqlQueryBuilder::new(
            dialect,
            TableIdentity::new(schema, table).unwrap(),
            columns,
            LevelFormat::Name,
        )
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_postgres_fetch_without_filter() {
        let b = builder(Dialect::Postgres, Some("public"), "logs", ColumnMapping::postgres());
        let params = QueryParameters::builder().page(3).page_size(20).build().unwrap();
        let stmt = b.fetch(&params);

        assert_eq!(
            stmt.text,
            "SELECT CAST(\"message\" AS TEXT) AS \"message\", \
             CAST(\"message_template\" AS TEXT) AS \"message_template\", \
             CAST(\"level\" AS TEXT) AS \"level\", \
             \"timestamp\" AS \"timestamp\", \
             CAST(\"exception\" AS TEXT) AS \"exception\", \
             CAST(\"properties\" AS TEXT) AS \"properties\", \
             CAST(\"log_event\" AS TEXT) AS \"log_event\" \
             FROM \"public\".\"logs\" ORDER BY \"timestamp\" DESC LIMIT $1 OFFSET $2"
        );
        assert_eq!(stmt.bindings, vec![BindValue::Int(20), BindValue::Int(40)]);
    }

    #[test]
    fn test_postgres_search_uses_ilike_with_escape() {
        let b = builder(Dialect::Postgres, Some("public"), "logs", ColumnMapping::postgres());
        let params = QueryParameters::builder().search_text("100%").build().unwrap();
        let stmt = b.count(&params);

        assert_eq!(
            stmt.text,
            "SELECT COUNT(*) AS \"total\" FROM \"public\".\"logs\" WHERE \
             (\"message\" ILIKE $1 ESCAPE '!' OR \"exception\" ILIKE $2 ESCAPE '!')"
        );
        assert_eq!(
            stmt.bindings,
            vec![
                BindValue::Text("%100!%%".into()),
                BindValue::Text("%100!%%".into())
            ]
        );
    }

    #[test]
    fn test_postgres_code_sink_binds_integer_level() {
        let b = SqlQueryBuilder::new(
            Dialect::Postgres,
            TableIdentity::new(Some("public"), "logs").unwrap(),
            ColumnMapping::postgres(),
            LevelFormat::Code,
        );
        let params = QueryParameters::builder().level("Warning").build().unwrap();
        let stmt = b.count(&params);
        assert!(stmt.text.ends_with("WHERE \"level\" = $1"));
        assert_eq!(stmt.bindings, vec![BindValue::Int(3)]);
    }

    #[test]
    fn test_sql_server_paginates_with_offset_fetch() {
        let b = builder(Dialect::SqlServer, Some("dbo"), "Logs", ColumnMapping::sql_server());
        let params = QueryParameters::builder()
            .page(2)
            .page_size(25)
            .level("error")
            .build()
            .unwrap();
        let stmt = b.fetch(&params);

        assert!(stmt.text.starts_with("SELECT CAST([Message] AS NVARCHAR(MAX)) AS [message]"));
        assert!(stmt.text.contains(" FROM [dbo].[Logs] WHERE [Level] = @P1 "));
        assert!(stmt.text.ends_with(
            "ORDER BY [TimeStamp] DESC OFFSET @P2 ROWS FETCH NEXT @P3 ROWS ONLY"
        ));
        assert_eq!(
            stmt.bindings,
            vec![
                BindValue::Text("Error".into()),
                BindValue::Int(25),
                BindValue::Int(25)
            ]
        );
    }

    #[test]
    fn test_sql_server_count_uses_count_big() {
        let b = builder(Dialect::SqlServer, Some("dbo"), "Logs", ColumnMapping::sql_server());
        let params = QueryParameters::builder().build().unwrap();
        assert_eq!(
            b.count(&params).text,
            "SELECT COUNT_BIG(*) AS [total] FROM [dbo].[Logs]"
        );
    }

    #[test]
    fn test_mysql_lowers_both_sides_and_ignores_schema() {
        let b = builder(Dialect::MySql, Some("app"), "Logs", ColumnMapping::mysql());
        let params = QueryParameters::builder().search_text("Time_Out").build().unwrap();
        let stmt = b.fetch(&params);

        assert!(stmt.text.contains("CAST(NULL AS CHAR) AS `log_event`"));
        assert!(stmt.text.contains(
            " FROM `Logs` WHERE (LOWER(`Message`) LIKE LOWER(?) ESCAPE '!' \
             OR LOWER(`Exception`) LIKE LOWER(?) ESCAPE '!')"
        ));
        assert!(stmt.text.ends_with("ORDER BY `Timestamp` DESC LIMIT ? OFFSET ?"));
        assert_eq!(stmt.bindings[0], BindValue::Text("%Time!_Out%".into()));
        assert_eq!(stmt.bindings.len(), 4);
    }

    #[test]
    fn test_sqlite_dates_compare_julian_days() {
        let b = builder(Dialect::Sqlite, None, "Logs", ColumnMapping::sqlite());
        let params = QueryParameters::builder()
            .start_date(day(3))
            .end_date(day(4))
            .build()
            .unwrap();
        let stmt = b.count(&params);

        assert_eq!(
            stmt.text,
            "SELECT COUNT(*) AS \"total\" FROM \"Logs\" WHERE \
             julianday(\"Timestamp\") >= julianday(?) AND julianday(\"Timestamp\") < julianday(?)"
        );
        assert_eq!(
            stmt.bindings,
            vec![BindValue::Timestamp(day(3)), BindValue::Timestamp(day(4))]
        );
    }

    #[test]
    fn test_sqlite_orders_by_julian_day() {
        let b = builder(Dialect::Sqlite, None, "Logs", ColumnMapping::sqlite());
        let stmt = b.fetch(&QueryParameters::builder().build().unwrap());
        assert!(stmt
            .text
            .ends_with("ORDER BY julianday(\"Timestamp\") DESC LIMIT ? OFFSET ?"));
    }

    #[test]
    fn test_sqlite_search_keeps_pattern_case() {
        let b = builder(Dialect::Sqlite, None, "Logs", ColumnMapping::sqlite());
        let params = QueryParameters::builder().search_text("Überweisung").build().unwrap();
        let stmt = b.count(&params);
        assert!(stmt
            .text
            .contains("LOWER(\"RenderedMessage\") LIKE LOWER(?) ESCAPE '!'"));
        assert_eq!(stmt.bindings[0], BindValue::Text("%Überweisung%".into()));
    }

    #[test]
    fn test_sqlite_missing_columns_select_null() {
        let b = builder(Dialect::Sqlite, None, "Logs", ColumnMapping::sqlite());
        let stmt = b.fetch(&QueryParameters::builder().build().unwrap());
        assert!(stmt.text.contains("CAST(NULL AS TEXT) AS \"message_template\""));
        assert!(stmt.text.contains("CAST(\"RenderedMessage\" AS TEXT) AS \"message\""));
    }

    #[test]
    fn test_additional_columns_selected_as_text() {
        let columns = ColumnMapping::mysql()
            .with_overrides(&crate::columns::ColumnOverrides {
                additional: vec!["EnvironmentName".into(), "SampleBool".into()],
                ..Default::default()
            })
            .unwrap();
        let b = builder(Dialect::MySql, None, "Logs", columns);
        let stmt = b.fetch(&QueryParameters::builder().build().unwrap());
        assert!(stmt.text.contains(
            "CAST(NULL AS CHAR) AS `log_event`, \
             CAST(`EnvironmentName` AS CHAR) AS `extra_0`, \
             CAST(`SampleBool` AS CHAR) AS `extra_1` FROM `Logs`"
        ));
    }

    #[test]
    fn test_unrecognized_level_matches_nothing() {
        let b = builder(Dialect::MySql, None, "Logs", ColumnMapping::mysql());
        let params = QueryParameters::builder().level("Loud").build().unwrap();
        let stmt = b.count(&params);
        assert_eq!(stmt.text, "SELECT COUNT(*) AS `total` FROM `Logs` WHERE 1 = 0");
        assert!(stmt.bindings.is_empty());
    }

    #[test]
    fn test_fetch_and_count_share_where_clause() {
        let b = builder(Dialect::Postgres, Some("public"), "logs", ColumnMapping::postgres());
        let params = QueryParameters::builder()
            .level("Information")
            .search_text("disk")
            .start_date(day(1))
            .end_date(day(2))
            .build()
            .unwrap();
        let fetch = b.fetch(&params);
        let count = b.count(&params);

        let where_of = |text: &str| {
            let start = text.find(" WHERE ").unwrap();
            let end = text.find(" ORDER BY ").unwrap_or(text.len());
            text[start..end].to_string()
        };
        assert_eq!(where_of(&fetch.text), where_of(&count.text));
        assert_eq!(fetch.bindings[..5], count.bindings[..]);
    }

    #[test]
    fn test_bind_value_display() {
        assert_eq!(BindValue::Text("x".into()).to_string(), "'x'");
        assert_eq!(BindValue::Int(5).to_string(), "5");
        assert_eq!(BindValue::Timestamp(day(1)).to_string(), "2024-03-01T00:00:00Z");
    }
}
