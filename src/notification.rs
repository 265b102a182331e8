use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Lenient parse: anything unrecognized falls back to `Info`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Severity::Success,
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl From<&str> for Severity {
    fn from(value: &str) -> Self {
        Severity::parse(value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hub-assigned identity. Allocated from a counter, never from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NotificationId(u64);

impl NotificationId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Accepts both `n42` and `42`.
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('n').unwrap_or(value);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok().map(Self)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<NotificationId> for String {
    fn from(id: NotificationId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for NotificationId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NotificationId::parse(&value).ok_or_else(|| format!("invalid notification id: {}", value))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    /// Loosely typed payload for consumers (e.g. `deletedHistory`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl NotificationRecord {
    pub(crate) fn new(id: NotificationId, message: String, severity: Severity) -> Self {
        Self {
            id,
            message,
            severity,
            created_at: Utc::now(),
            details: None,
        }
    }

    pub(crate) fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }

    pub fn mentions(&self, pattern: &str) -> bool {
        self.message.contains(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_defaults_to_info() {
        assert_eq!(Severity::parse("bogus"), Severity::Info);
        assert_eq!(Severity::parse(""), Severity::Info);
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_severity_parse_is_lenient_on_case() {
        assert_eq!(Severity::parse("Warning"), Severity::Warning);
        assert_eq!(Severity::parse(" ERROR "), Severity::Error);
        assert_eq!(Severity::from("success"), Severity::Success);
        assert_eq!(Severity::Error.to_string(), "error");
    }

    #[test]
    fn test_notification_id_display_and_parse() {
        let id = NotificationId::new(7);
        assert_eq!(id.to_string(), "n7");
        assert_eq!(NotificationId::parse("n7"), Some(id));
        assert_eq!(NotificationId::parse("7"), Some(id));
        assert_eq!(NotificationId::parse("n"), None);
        assert_eq!(NotificationId::parse("abc"), None);
        assert_eq!(NotificationId::parse("n+5"), None);
        assert_eq!(NotificationId::parse("+5"), None);
        assert_eq!(NotificationId::parse("n-1"), None);
        assert_eq!(NotificationId::parse("n 5"), None);
        assert!(NotificationId::new(1) < NotificationId::new(2));
    }

    #[test]
    fn test_record_json_format() -> anyhow::Result<()> {
        let record = NotificationRecord::new(
            NotificationId::new(3),
            "Disk full".to_string(),
            Severity::Error,
        );

        let json = serde_json::to_value(&record)?;
        assert_eq!(json["id"], "n3");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["message"], "Disk full");
        assert!(json.get("details").is_none());

        let parsed: NotificationRecord = serde_json::from_value(json)?;
        assert_eq!(parsed, record);
        Ok(())
    }

    #[test]
    fn test_record_mentions_is_case_sensitive() {
        let record = NotificationRecord::new(
            NotificationId::new(1),
            "VM-1 removed".to_string(),
            Severity::Info,
        );
        assert!(record.mentions("VM-1"));
        assert!(!record.mentions("vm-1"));
        assert!(record.mentions(""));
    }
}
