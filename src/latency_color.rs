use egui::Color32;

use crate::host_record::HostRecord;
use crate::ping::HostStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyThresholds {
    pub good_ms: f64,
    pub warning_ms: f64,
}

impl Default for LatencyThresholds {
    fn default() -> Self {
        Self {
            good_ms: 50.0,
            warning_ms: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyClass {
    Unknown,
    Good,
    Warning,
    Poor,
    Offline,
}

impl LatencyClass {
    pub fn to_color32(self) -> Color32 {
        match self {
            LatencyClass::Unknown => Color32::GRAY,
            LatencyClass::Good => Color32::GREEN,
            LatencyClass::Warning => Color32::YELLOW,
            LatencyClass::Poor => Color32::from_rgb(255, 165, 0),
            LatencyClass::Offline => Color32::RED,
        }
    }

    pub fn from_rtt(rtt_ms: Option<f64>, thresholds: LatencyThresholds) -> Self {
        match rtt_ms {
            Some(rtt) if rtt <= thresholds.good_ms => LatencyClass::Good,
            Some(rtt) if rtt <= thresholds.warning_ms => LatencyClass::Warning,
            Some(_) => LatencyClass::Poor,
            None => LatencyClass::Offline,
        }
    }

    pub fn for_record(record: &HostRecord, thresholds: LatencyThresholds) -> Self {
        match record.status {
            HostStatus::Unknown => LatencyClass::Unknown,
            HostStatus::Offline => LatencyClass::Offline,
            HostStatus::Online => Self::from_rtt(record.current_rtt_ms, thresholds),
        }
    }
}
