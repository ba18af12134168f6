//! Canonical log entry and result page.

use crate::level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Encoding of the `properties` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Json,
    Xml,
}

/// One log record, independent of the backend it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// 1-based position within the whole filtered result.
    #[serde(rename = "rowNo")]
    pub row_number: u64,
    pub level: String,
    pub message: String,
    pub message_template: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub exception: Option<String>,
    pub properties: Option<String>,
    pub property_type: PropertyType,
    /// Configured extra columns with a non-blank value, as text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_columns: BTreeMap<String, String>,
}

/// A record as read from a backend, before row numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Option<String>,
    pub message: Option<String>,
    pub message_template: Option<String>,
    pub exception: Option<String>,
    pub properties: Option<String>,
    /// Secondary payload used when `properties` is empty.
    pub log_event: Option<String>,
    /// Extra columns in mapping order, by column name.
    pub additional: Vec<(String, Option<String>)>,
}

impl RawLogRecord {
    /// Convert to the canonical entry. `properties_type` is how the sink
    /// encodes its primary properties column; the log-event payload is
    /// always JSON.
    pub fn into_entry(self, row_number: u64, properties_type: PropertyType) -> LogEntry {
        let (properties, property_type) =
            match (non_blank(self.properties), non_blank(self.log_event)) {
                (Some(properties), _) => (Some(properties), properties_type),
                (None, Some(log_event)) => (Some(log_event), PropertyType::Json),
                (None, None) => (None, properties_type),
            };

        LogEntry {
            row_number,
            level: self
                .level
                .as_deref()
                .map(level::display_stored)
                .unwrap_or_default(),
            message: self.message.unwrap_or_default(),
            message_template: self.message_template,
            timestamp: self.timestamp,
            exception: non_blank(self.exception),
            properties,
            property_type,
            additional_columns: self
                .additional
                .into_iter()
                .filter_map(|(name, value)| non_blank(value).map(|v| (name, v)))
                .collect(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One page of entries plus the size of the whole filtered result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    pub entries: Vec<LogEntry>,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> RawLogRecord {
        RawLogRecord {
            level: Some("2".into()),
            message: Some("started".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_properties_win() {
        let entry = RawLogRecord {
            properties: Some("<properties/>".into()),
            log_event: Some("{\"a\":1}".into()),
            ..record()
        }
        .into_entry(7, PropertyType::Xml);
        assert_eq!(entry.properties.as_deref(), Some("<properties/>"));
        assert_eq!(entry.property_type, PropertyType::Xml);
        assert_eq!(entry.row_number, 7);
    }

    #[test]
    fn test_blank_properties_fall_back_to_log_event() {
        let entry = RawLogRecord {
            properties: Some("  ".into()),
            log_event: Some("{\"a\":1}".into()),
            ..record()
        }
        .into_entry(1, PropertyType::Xml);
        assert_eq!(entry.properties.as_deref(), Some("{\"a\":1}"));
        assert_eq!(entry.property_type, PropertyType::Json);
    }

    #[test]
    fn test_both_payloads_empty_is_none() {
        let entry = record().into_entry(1, PropertyType::Json);
        assert_eq!(entry.properties, None);
        assert_eq!(entry.property_type, PropertyType::Json);
    }

    #[test]
    fn test_stored_level_code_is_displayed_by_name() {
        let entry = record().into_entry(1, PropertyType::Json);
        assert_eq!(entry.level, "Information");
        assert_eq!(entry.message, "started");
    }

    #[test]
    fn test_additional_columns_keep_non_blank_values() {
        let entry = RawLogRecord {
            additional: vec![
                ("EnvironmentName".into(), Some("staging".into())),
                ("SampleBool".into(), Some("1".into())),
                ("EnvironmentUserName".into(), None),
                ("SampleDate".into(), Some(" ".into())),
            ],
            ..record()
        }
        .into_entry(1, PropertyType::Json);
        assert_eq!(
            entry.additional_columns,
            BTreeMap::from([
                ("EnvironmentName".to_string(), "staging".to_string()),
                ("SampleBool".to_string(), "1".to_string()),
            ])
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["additionalColumns"]["EnvironmentName"], "staging");
    }

    #[test]
    fn test_serializes_with_row_no_and_camel_case() {
        let entry = record().into_entry(3, PropertyType::Json);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["rowNo"], 3);
        assert_eq!(json["propertyType"], "json");
        assert!(json.get("messageTemplate").is_some());
        assert!(json.get("additionalColumns").is_none());
    }
}
