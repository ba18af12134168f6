//! # Column Mapping
//!
//! Translates canonical log fields to the physical columns (or document
//! fields) of a configured sink. Mappings are built once at provider
//! construction and shared read-only for the life of the process.
//!
//! Column and table names are the only text ever interpolated into SQL, so
//! every name is checked against a plain identifier pattern here.

use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern compiles")
    })
}

pub(crate) fn validate_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { field });
    }
    if !identifier_pattern().is_match(value) {
        return Err(ConfigError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Physical names for each canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    message: String,
    message_template: Option<String>,
    level: String,
    timestamp: String,
    exception: String,
    properties: String,
    log_event: Option<String>,
    additional: Vec<String>,
}

/// Partial override of a preset, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnOverrides {
    pub message: Option<String>,
    pub message_template: Option<String>,
    pub level: Option<String>,
    pub timestamp: Option<String>,
    pub exception: Option<String>,
    pub properties: Option<String>,
    pub log_event: Option<String>,
    /// Extra columns returned verbatim, keyed by column name.
    #[serde(default)]
    pub additional: Vec<String>,
}

impl ColumnMapping {
    #[allow(clippy::too_many_arguments)]
    fn preset(
        message: &str,
        message_template: Option<&str>,
        level: &str,
        timestamp: &str,
        exception: &str,
        properties: &str,
        log_event: Option<&str>,
    ) -> Self {
        Self {
            message: message.into(),
            message_template: message_template.map(Into::into),
            level: level.into(),
            timestamp: timestamp.into(),
            exception: exception.into(),
            properties: properties.into(),
            log_event: log_event.map(Into::into),
            additional: Vec::new(),
        }
    }

    /// `Serilog.Sinks.MSSqlServer` default table.
    pub fn sql_server() -> Self {
        Self::preset(
            "Message",
            Some("MessageTemplate"),
            "Level",
            "TimeStamp",
            "Exception",
            "Properties",
            Some("LogEvent"),
        )
    }

    /// `Serilog.Sinks.PostgreSQL` default table.
    pub fn postgres() -> Self {
        Self::preset(
            "message",
            Some("message_template"),
            "level",
            "timestamp",
            "exception",
            "properties",
            Some("log_event"),
        )
    }

    /// `Serilog.Sinks.Postgresql.Alternative` default table.
    pub fn postgres_alternative() -> Self {
        Self::preset(
            "Message",
            Some("MessageTemplate"),
            "Level",
            "Timestamp",
            "Exception",
            "Properties",
            Some("LogEvent"),
        )
    }

    /// `Serilog.Sinks.MySQL` / MariaDB default table.
    pub fn mysql() -> Self {
        Self::preset(
            "Message",
            Some("MessageTemplate"),
            "Level",
            "Timestamp",
            "Exception",
            "Properties",
            None,
        )
    }

    /// `Serilog.Sinks.SQLite` default table.
    pub fn sqlite() -> Self {
        Self::preset(
            "RenderedMessage",
            None,
            "Level",
            "Timestamp",
            "Exception",
            "Properties",
            None,
        )
    }

    /// `Serilog.Sinks.MongoDB` document fields.
    pub fn mongodb() -> Self {
        Self::preset(
            "RenderedMessage",
            Some("MessageTemplate"),
            "Level",
            "Timestamp",
            "Exception",
            "Properties",
            None,
        )
    }

    /// Apply configured overrides on top of this mapping and validate the
    /// result.
    pub fn with_overrides(mut self, overrides: &ColumnOverrides) -> Result<Self, ConfigError> {
        let replace = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *slot = v.clone();
            }
        };
        replace(&mut self.message, &overrides.message);
        replace(&mut self.level, &overrides.level);
        replace(&mut self.timestamp, &overrides.timestamp);
        replace(&mut self.exception, &overrides.exception);
        replace(&mut self.properties, &overrides.properties);
        if overrides.message_template.is_some() {
            self.message_template = overrides.message_template.clone();
        }
        if overrides.log_event.is_some() {
            self.log_event = overrides.log_event.clone();
        }
        for column in &overrides.additional {
            if !self.additional.contains(column) {
                self.additional.push(column.clone());
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("columns.message", &self.message)?;
        validate_identifier("columns.level", &self.level)?;
        validate_identifier("columns.timestamp", &self.timestamp)?;
        validate_identifier("columns.exception", &self.exception)?;
        validate_identifier("columns.properties", &self.properties)?;
        if let Some(template) = &self.message_template {
            validate_identifier("columns.message_template", template)?;
        }
        if let Some(log_event) = &self.log_event {
            validate_identifier("columns.log_event", log_event)?;
        }
        for column in &self.additional {
            validate_identifier("columns.additional", column)?;
        }
        Ok(())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn message_template(&self) -> Option<&str> {
        self.message_template.as_deref()
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn exception(&self) -> &str {
        &self.exception
    }

    pub fn properties(&self) -> &str {
        &self.properties
    }

    pub fn log_event(&self) -> Option<&str> {
        self.log_event.as_deref()
    }

    /// Configured extra columns, in configuration order.
    pub fn additional(&self) -> &[String] {
        &self.additional
    }
}

/// Schema-qualified table (or database-qualified collection) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIdentity {
    schema: Option<String>,
    name: String,
}

impl TableIdentity {
    pub fn new(schema: Option<&str>, name: &str) -> Result<Self, ConfigError> {
        validate_identifier("table", name)?;
        let schema = match schema.map(str::trim).filter(|s| !s.is_empty()) {
            Some(schema) => {
                validate_identifier("schema", schema)?;
                Some(schema.to_string())
            }
            None => None,
        };
        Ok(Self {
            schema,
            name: name.to_string(),
        })
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
