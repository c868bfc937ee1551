use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

pub const VALUE_PREFIX: &str = "startup-smoke-";

/// The single record produced per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeMessage {
    pub key: String,
    pub value: String,
}

impl SmokeMessage {
    /// Fresh random key, value stamped with the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            key: Uuid::new_v4().to_string(),
            value: format!(
                "{}{}",
                VALUE_PREFIX,
                timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
            ),
        }
    }
}

impl Default for SmokeMessage {
    fn default() -> Self {
        Self::new()
    }
}
