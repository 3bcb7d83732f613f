use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one probe against one host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PingSample {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub rtt_ms: Option<f64>,
}

impl PingSample {
    pub fn success(timestamp: DateTime<Utc>, rtt_ms: f64) -> Self {
        Self {
            timestamp,
            success: true,
            rtt_ms: Some(rtt_ms),
        }
    }

    pub fn failure(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            success: false,
            rtt_ms: None,
        }
    }

    pub fn from_rtt(timestamp: DateTime<Utc>, rtt: Duration) -> Self {
        Self::success(timestamp, rtt.as_micros() as f64 / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl HostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HostStatus::Unknown => "unknown",
            HostStatus::Online => "online",
            HostStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
