//! Syntax differences between the supported SQL dialects.

use crate::columns::TableIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Escape character used in every generated `LIKE`.
pub const LIKE_ESCAPE: char = '!';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "postgres")]
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "sqlite")]
    Sqlite,
    #[serde(rename = "sqlserver")]
    SqlServer,
}

impl Dialect {
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::Postgres | Self::Sqlite => format!("\"{}\"", ident),
            Self::MySql => format!("`{}`", ident),
            Self::SqlServer => format!("[{}]", ident),
        }
    }

    /// Placeholder for the `index`-th bound value (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${}", index),
            Self::SqlServer => format!("@P{}", index),
            Self::MySql | Self::Sqlite => "?".to_string(),
        }
    }

    /// MySQL treats the schema as the connection's database and SQLite has
    /// none, so only PostgreSQL and SQL Server qualify table names.
    pub fn uses_schema(self) -> bool {
        matches!(self, Self::Postgres | Self::SqlServer)
    }

    pub fn default_schema(self) -> Option<&'static str> {
        match self {
            Self::Postgres => Some("public"),
            Self::SqlServer => Some("dbo"),
            Self::MySql | Self::Sqlite => None,
        }
    }

    pub fn qualified_table(self, table: &TableIdentity) -> String {
        match table.schema() {
            Some(schema) if self.uses_schema() => {
                format!("{}.{}", self.quote(schema), self.quote(table.name()))
            }
            _ => self.quote(table.name()),
        }
    }

    /// Cast an expression to the dialect's unbounded text type.
    pub fn text(self, expr: &str) -> String {
        match self {
            Self::Postgres | Self::Sqlite => format!("CAST({} AS TEXT)", expr),
            Self::MySql => format!("CAST({} AS CHAR)", expr),
            Self::SqlServer => format!("CAST({} AS NVARCHAR(MAX))", expr),
        }
    }

    pub fn count_all(self) -> &'static str {
        match self {
            Self::SqlServer => "COUNT_BIG(*)",
            _ => "COUNT(*)",
        }
    }

    /// PostgreSQL has a native case-insensitive `ILIKE`; the others compare
    /// `LOWER(column)` against `LOWER(pattern)`, folded by the same function.
    pub fn has_ilike(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// SQLite stores timestamps as text in several layouts; comparing
    /// `julianday()` values orders them chronologically.
    pub fn compares_julian_days(self) -> bool {
        matches!(self, Self::Sqlite)
    }

    /// Escape `text` for use inside a `LIKE` pattern with [`LIKE_ESCAPE`].
    pub fn escape_like(self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len() + 2);
        for ch in text.chars() {
            let special = matches!(ch, '%' | '_' | LIKE_ESCAPE)
                || (ch == '[' && self == Self::SqlServer);
            if special {
                escaped.push(LIKE_ESCAPE);
            }
            escaped.push(ch);
        }
        escaped
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::MySql => write!(f, "mysql"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::SqlServer => write!(f, "sqlserver"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "npgsql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            other => Err(format!("unknown SQL dialect '{}'", other)),
        }
    }
}
