use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cookies::parse_timestamp;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const WARNING_DAYS: i64 = 7;

#[derive(uniffi::Enum, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationStatus {
    Unknown,
    Expired,
    Warning,
    Valid,
}

/// How the admin panel renders a cookie set's expiration.
#[derive(uniffi::Record, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ExpirationInfo {
    pub text: String,
    pub status: ExpirationStatus,
    /// CSS color for the badge.
    pub color_hint: String,
}

impl ExpirationInfo {
    fn new(text: impl Into<String>, status: ExpirationStatus, color_hint: &str) -> Self {
        Self {
            text: text.into(),
            status,
            color_hint: color_hint.to_owned(),
        }
    }
}

pub fn format_expiration(expires_at: Option<&str>) -> ExpirationInfo {
    format_expiration_at(expires_at.and_then(parse_timestamp), Utc::now())
}

/// Classifies `expires_at` relative to `now`. The remaining time is rounded up
/// to whole days; one day or less reads as "today".
pub fn format_expiration_at(
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ExpirationInfo {
    let Some(expires_at) = expires_at else {
        return ExpirationInfo::new("Unknown", ExpirationStatus::Unknown, "#888888");
    };

    if expires_at < now {
        return ExpirationInfo::new("Expired", ExpirationStatus::Expired, "#ea4335");
    }

    let remaining_ms = (expires_at - now).num_milliseconds();
    let days = (remaining_ms + DAY_MS - 1) / DAY_MS;

    if days <= 1 {
        ExpirationInfo::new("Expires today", ExpirationStatus::Warning, "#fbbc05")
    } else if days <= WARNING_DAYS {
        ExpirationInfo::new(
            format!("{days} days left"),
            ExpirationStatus::Warning,
            "#fbbc05",
        )
    } else {
        ExpirationInfo::new(
            format!("{days} days left"),
            ExpirationStatus::Valid,
            "#34a853",
        )
    }
}
