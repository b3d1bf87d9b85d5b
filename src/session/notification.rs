//! Transient user-visible notifications

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::CropError;

// One year
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A message shown to the user for a limited time
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Error code when the notification reports a failure
    pub code: Option<&'static str>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn info(message: impl Into<String>, ttl_secs: u64) -> Self {
        Self::build(NotificationLevel::Info, message.into(), None, ttl_secs)
    }

    pub fn from_error(error: &CropError, ttl_secs: u64) -> Self {
        Self::build(
            NotificationLevel::Error,
            error.friendly_message(),
            Some(error.error_code()),
            ttl_secs,
        )
    }

    fn build(
        level: NotificationLevel,
        message: String,
        code: Option<&'static str>,
        ttl_secs: u64,
    ) -> Self {
        let created_at = Utc::now();
        let ttl = Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64);
        Self {
            level,
            message,
            code,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NotificationLevel::Info => write!(f, "{}", self.message),
            NotificationLevel::Error => write!(f, "error: {}", self.message),
        }
    }
}
