use std::sync::OnceLock;

use bench_core::LogLevel;
use regex::Regex;

/// Receives progress events emitted during an agent run.
///
/// Implementations must never fail; a sink whose session is gone just
/// drops the event.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: LogLevel, message: &str, data: Option<serde_json::Value>);

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message, None);
    }

    fn warning(&self, message: &str) {
        self.emit(LogLevel::Warning, message, None);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message, None);
    }

    fn success(&self, message: &str) {
        self.emit(LogLevel::Success, message, None);
    }

    fn action(&self, message: &str, data: Option<serde_json::Value>) {
        self.emit(LogLevel::Action, message, data);
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _level: LogLevel, _message: &str, _data: Option<serde_json::Value>) {}
}

/// Severity attached to a free-text log line by the automation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LineSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

impl LineSeverity {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "TRACE" => Self::Debug,
            "WARN" | "WARNING" => Self::Warning,
            "ERROR" | "CRITICAL" | "FATAL" => Self::Error,
            _ => Self::Info,
        }
    }
}

const ACTION_MARKERS: [&str; 5] = ["🖱️", "⌨️", "📜", "🔗", "👁️"];

fn logger_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^\w+\s+\[.*?\]\s*").expect("valid logger prefix regex"))
}

/// Map a free-text log line onto a [`LogLevel`] and strip its logger prefix.
///
/// This is a heuristic: severity decides errors and warnings, otherwise the
/// text is searched for success and action markers. Returns `None` when
/// nothing is left after stripping.
pub fn classify_line(severity: LineSeverity, line: &str) -> Option<(LogLevel, String)> {
    let level = if severity >= LineSeverity::Error {
        LogLevel::Error
    } else if severity >= LineSeverity::Warning {
        LogLevel::Warning
    } else if line.contains('✅') || line.to_lowercase().contains("success") {
        LogLevel::Success
    } else if ACTION_MARKERS.iter().any(|m| line.contains(m)) {
        LogLevel::Action
    } else {
        LogLevel::Info
    };

    let clean = logger_prefix().replace(line, "").trim().to_string();
    if clean.is_empty() {
        None
    } else {
        Some((level, clean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_wins_over_markers() {
        let (level, _) = classify_line(LineSeverity::Error, "✅ step done").unwrap();
        assert_eq!(level, LogLevel::Error);
        let (level, _) = classify_line(LineSeverity::Warning, "🖱️ click").unwrap();
        assert_eq!(level, LogLevel::Warning);
    }

    #[test]
    fn test_markers_classify_info_lines() {
        let cases = [
            ("✅ Task completed", LogLevel::Success),
            ("Navigation was a Success", LogLevel::Success),
            ("🖱️ Clicked button with index 4", LogLevel::Action),
            ("🔗 Navigated to https://example.com", LogLevel::Action),
            ("📍 Step 3", LogLevel::Info),
        ];
        for (line, expected) in cases {
            let (level, _) = classify_line(LineSeverity::Info, line).unwrap();
            assert_eq!(level, expected, "line: {line}");
        }
    }

    #[test]
    fn test_logger_prefix_is_stripped() {
        let (_, message) =
            classify_line(LineSeverity::Info, "INFO     [agent] 📍 Step 1").unwrap();
        assert_eq!(message, "📍 Step 1");
        assert!(classify_line(LineSeverity::Info, "INFO [agent]   ").is_none());
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(LineSeverity::parse("warning"), LineSeverity::Warning);
        assert_eq!(LineSeverity::parse("CRITICAL"), LineSeverity::Error);
        assert_eq!(LineSeverity::parse("whatever"), LineSeverity::Info);
    }
}
