//! Per-host rolling statistics and the fold that advances them.

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use serde::Serialize;

use crate::ping::{HostStatus, PingSample};

/// Rolling state for one tracked host.
///
/// `total_sent`/`total_received` cover the whole session, while the RTT
/// aggregates only look at the samples still held in `history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostRecord {
    pub ip: Ipv4Addr,
    pub hostname: Option<String>,
    pub status: HostStatus,
    pub current_rtt_ms: Option<f64>,
    pub avg_rtt_ms: Option<f64>,
    pub min_rtt_ms: Option<f64>,
    pub max_rtt_ms: Option<f64>,
    pub total_sent: u64,
    pub total_received: u64,
    pub packet_loss_pct: f64,
    pub history: VecDeque<PingSample>,
    #[serde(skip)]
    history_capacity: usize,
}

impl HostRecord {
    pub fn new(ip: Ipv4Addr, history_capacity: usize) -> Self {
        let history_capacity = history_capacity.max(1);
        Self {
            ip,
            hostname: None,
            status: HostStatus::Unknown,
            current_rtt_ms: None,
            avg_rtt_ms: None,
            min_rtt_ms: None,
            max_rtt_ms: None,
            total_sent: 0,
            total_received: 0,
            packet_loss_pct: 0.0,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
        }
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Folds one sample into the record and returns the advanced record.
    pub fn fold(mut self, sample: PingSample) -> Self {
        self.apply(sample);
        self
    }

    /// In-place form of [`HostRecord::fold`].
    pub fn apply(&mut self, sample: PingSample) {
        // Online requires a usable current RTT.
        let sample = match (sample.success, sample.rtt_ms) {
            (true, Some(rtt)) if rtt.is_finite() && rtt >= 0.0 => sample,
            _ => PingSample::failure(sample.timestamp),
        };

        while self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(sample);

        self.total_sent += 1;
        if sample.success {
            self.total_received += 1;
            self.status = HostStatus::Online;
            self.current_rtt_ms = sample.rtt_ms;
        } else {
            self.status = HostStatus::Offline;
            self.current_rtt_ms = None;
        }

        self.recompute_rtt_window();
        self.packet_loss_pct = loss_percent(self.total_sent, self.total_received);
    }

    fn recompute_rtt_window(&mut self) {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for rtt in self.successful_rtts() {
            count += 1;
            sum += rtt;
            min = min.min(rtt);
            max = max.max(rtt);
        }

        if count == 0 {
            self.avg_rtt_ms = None;
            self.min_rtt_ms = None;
            self.max_rtt_ms = None;
        } else {
            // Clamp guards against float rounding pushing the mean outside [min, max].
            self.avg_rtt_ms = Some((sum / count as f64).clamp(min, max));
            self.min_rtt_ms = Some(min);
            self.max_rtt_ms = Some(max);
        }
    }

    fn successful_rtts(&self) -> impl Iterator<Item = f64> + '_ {
        self.history
            .iter()
            .filter(|s| s.success)
            .filter_map(|s| s.rtt_ms)
    }

    /// Sets the hostname only if none is known yet. Returns whether it changed.
    pub fn merge_hostname(&mut self, hostname: Option<&str>) -> bool {
        match (&self.hostname, hostname) {
            (None, Some(name)) if !name.is_empty() => {
                self.hostname = Some(name.to_string());
                true
            }
            _ => false,
        }
    }

    /// History as RTT points for sparklines; failures are `None`.
    pub fn recent_rtts(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.history.iter().map(|s| s.rtt_ms)
    }
}

pub fn loss_percent(total_sent: u64, total_received: u64) -> f64 {
    if total_sent == 0 {
        return 0.0;
    }
    let lost = total_sent.saturating_sub(total_received);
    100.0 * lost as f64 / total_sent as f64
}
