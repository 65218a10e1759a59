// Domain model for monitored services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Classified outcome of the most recent probe for a service.
///
/// `Unknown` is the only legal initial value; everything after that is
/// written exclusively by the probing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Unknown,
    Up,
    Down,
    Alarm,
}

impl Status {
    /// True for statuses that represent a failure condition.
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Down | Status::Alarm)
    }

    /// Parses a status value reported by a remote health endpoint.
    ///
    /// Matching is case-insensitive; anything unrecognized yields `None`
    /// so the caller keeps its own classification.
    pub fn from_report(raw: &str) -> Option<Status> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "UNKNOWN" => Some(Status::Unknown),
            "UP" => Some(Status::Up),
            "DOWN" => Some(Status::Down),
            "ALARM" => Some(Status::Alarm),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unknown => "UNKNOWN",
            Status::Up => "UP",
            Status::Down => "DOWN",
            Status::Alarm => "ALARM",
        };
        f.write_str(s)
    }
}

/// One monitored service as stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    pub endpoint: String,
    /// Effective polling period. Clamping below the configured minimum
    /// happens at registration intake, so a stored interval is never zero.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub status: Status,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

impl ServiceRecord {
    /// Creates a fresh record in the `Unknown` state.
    pub fn new(name: String, endpoint: String, interval: Duration, recipients: Vec<String>) -> Self {
        Self {
            name,
            endpoint,
            interval,
            recipients,
            status: Status::Unknown,
            last_checked: None,
        }
    }
}

/// Registration request body accepted by the HTTP API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub frequency_seconds: Option<u64>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// Result of an atomic status write against the registry.
///
/// `prior` is the status as it stood immediately before the write, read
/// inside the same critical section, so transition detection never races
/// against concurrent updates or compares against a stale cached copy.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub prior: Status,
    pub current: Status,
    /// Snapshot of the record after the write.
    pub record: ServiceRecord,
}

impl StatusChange {
    /// True when the probe actually observed a different status.
    pub fn is_transition(&self) -> bool {
        self.prior != self.current
    }
}
