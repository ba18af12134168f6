//! # Level Normalizer
//!
//! Sink families persist the event level differently: most write the
//! Serilog level name (`"Information"`), the classic PostgreSQL sink writes
//! the integer severity (`2`). This module maps the operator's level name to
//! whatever the configured sink stores, and maps stored values back to a
//! readable name.
//!
//! Unrecognized level names never raise an error. They normalize to
//! [`LevelFilter::Unrecognized`], which every backend renders as a filter
//! that matches no rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical Serilog levels, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Information,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Integer severity as written by code-based sinks.
    pub const fn code(self) -> i64 {
        match self {
            Self::Verbose => 0,
            Self::Debug => 1,
            Self::Information => 2,
            Self::Warning => 3,
            Self::Error => 4,
            Self::Fatal => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verbose => "Verbose",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.code() == code)
    }

    /// Case-insensitive parse of a level name, a common alias, or a
    /// numeric severity.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if let Ok(code) = value.parse::<i64>() {
            return Self::from_code(code);
        }
        match value.to_ascii_lowercase().as_str() {
            "verbose" | "trace" => Some(Self::Verbose),
            "debug" => Some(Self::Debug),
            "information" | "info" => Some(Self::Information),
            "warning" | "warn" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            "fatal" | "critical" => Some(Self::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a sink persists the level column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelFormat {
    /// Serilog level name, e.g. `"Warning"`.
    #[default]
    Name,
    /// Integer severity, e.g. `3`.
    Code,
}

/// A level in the representation stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelValue {
    Name(&'static str),
    Code(i64),
}

/// Outcome of normalizing the requested level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelFilter {
    /// No level requested.
    Any,
    Match(LevelValue),
    /// A level name no sink writes. Matches nothing.
    Unrecognized,
}

pub fn normalize(level: Option<&str>, format: LevelFormat) -> LevelFilter {
    let Some(raw) = level.filter(|l| !l.trim().is_empty()) else {
        return LevelFilter::Any;
    };
    match (LogLevel::parse(raw), format) {
        (Some(level), LevelFormat::Name) => LevelFilter::Match(LevelValue::Name(level.as_str())),
        (Some(level), LevelFormat::Code) => LevelFilter::Match(LevelValue::Code(level.code())),
        (None, _) => LevelFilter::Unrecognized,
    }
}

/// Readable level for a stored value: `"4"` and `"error"` both become
/// `"Error"`. Values that are not Serilog levels pass through untouched.
pub fn display_stored(raw: &str) -> String {
    match LogLevel::parse(raw) {
        Some(level) => level.as_str().to_string(),
        None => raw.to_string(),
    }
}
