use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Format of [`LogEntry::timestamp`]: UTC wall clock, second resolution, no offset suffix.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
    Action,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
            Self::Action => "action",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            "success" => Some(Self::Success),
            "action" => Some(Self::Action),
            _ => None,
        }
    }
}

/// One line of a session's progress log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    #[cfg_attr(feature = "typescript", ts(type = "Record<string, unknown> | null"))]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self::at(Utc::now(), level, message)
    }

    pub fn at(time: DateTime<Utc>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: time.format(LOG_TIMESTAMP_FORMAT).to_string(),
            level,
            message: message.into(),
            data: None,
            model_id: None,
        }
    }

    pub fn with_model(mut self, model_id: Option<&str>) -> Self {
        self.model_id = model_id.map(str::to_string);
        self
    }

    pub fn with_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.data = data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_has_second_resolution() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap();
        let entry = LogEntry::at(time, LogLevel::Info, "hello");
        assert_eq!(entry.timestamp, "2024-05-01 13:04:05");
    }

    #[test]
    fn test_new_entry_uses_utc_clock() {
        let before = Utc::now().format(LOG_TIMESTAMP_FORMAT).to_string();
        let entry = LogEntry::new(LogLevel::Info, "hello");
        let after = Utc::now().format(LOG_TIMESTAMP_FORMAT).to_string();
        assert!(
            entry.timestamp == before || entry.timestamp == after,
            "{} not in [{}, {}]",
            entry.timestamp,
            before,
            after
        );
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let entry = LogEntry::new(LogLevel::Success, "done");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "success");
        assert!(json.get("data").is_none());
        assert!(json.get("model_id").is_none());

        let entry = entry.with_model(Some("gpt-4o"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["model_id"], "gpt-4o");
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert_eq!(LogLevel::parse("action"), Some(LogLevel::Action));
        assert_eq!(LogLevel::parse("debug"), None);
    }
}
