//! Offline statement generation: what a provider for `dialect` would send.

use ll_core::{ColumnMapping, ConfigError, Dialect, LevelFormat, SqlQueryBuilder, TableIdentity};

/// Column preset and level encoding of the standard sink for `dialect`.
pub fn sink_layout(dialect: Dialect) -> (ColumnMapping, LevelFormat) {
    match dialect {
        Dialect::Postgres => (ColumnMapping::postgres(), LevelFormat::Code),
        Dialect::MySql => (ColumnMapping::mysql(), LevelFormat::Name),
        Dialect::Sqlite => (ColumnMapping::sqlite(), LevelFormat::Name),
        Dialect::SqlServer => (ColumnMapping::sql_server(), LevelFormat::Name),
    }
}

pub fn query_builder(
    dialect: Dialect,
    schema: Option<&str>,
    table: &str,
) -> Result<SqlQueryBuilder, ConfigError> {
    let schema = schema
        .filter(|s| !s.trim().is_empty())
        .or(dialect.default_schema());
    let table = TableIdentity::new(schema, table)?;
    let (columns, level_format) = sink_layout(dialect);
    Ok(SqlQueryBuilder::new(dialect, table, columns, level_format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ll_core::{BindValue, QueryParameters};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_schema_applied() {
        let builder = query_builder(Dialect::SqlServer, None, "Logs").unwrap();
        assert_eq!(builder.table().schema(), Some("dbo"));
        let builder = query_builder(Dialect::MySql, Some(" "), "Logs").unwrap();
        assert_eq!(builder.table().schema(), None);
    }

    #[test]
    fn test_postgres_binds_level_code() {
        let builder = query_builder(Dialect::Postgres, None, "logs").unwrap();
        let params = QueryParameters::builder().level("Error").build().unwrap();
        let stmt = builder.count(&params);
        assert_eq!(stmt.bindings, vec![BindValue::Int(4)]);
    }

    #[test]
    fn test_invalid_table_rejected() {
        assert!(query_builder(Dialect::Sqlite, None, "Logs; DROP TABLE Logs").is_err());
    }
}
