//! One probe cycle: fan out to every host in bounded batches, fan the
//! results back in, and build a complete replacement store.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use chrono::Utc;
use futures::future::join_all;
use log::debug;

use crate::host_record::HostRecord;
use crate::ping::PingSample;
use crate::ping_executor::Prober;

pub type HostStore = HashMap<Ipv4Addr, HostRecord>;

/// Probes every host in `hosts` once and returns the next store.
///
/// At most `batch_size` probes are in flight at a time; each batch must
/// fully resolve before the next one is launched. A probe error only turns
/// into a failed sample for its own host. Hosts missing from `prior` start
/// from a fresh record.
pub async fn run_cycle(
    hosts: &[Ipv4Addr],
    prior: &HostStore,
    prober: &dyn Prober,
    batch_size: usize,
    history_capacity: usize,
) -> HostStore {
    let mut next = HostStore::with_capacity(hosts.len());

    for batch in hosts.chunks(batch_size.max(1)) {
        let samples = join_all(batch.iter().map(|&ip| probe_one(prober, ip))).await;

        for (&ip, sample) in batch.iter().zip(samples) {
            let record = prior
                .get(&ip)
                .cloned()
                .unwrap_or_else(|| HostRecord::new(ip, history_capacity));
            next.insert(ip, record.fold(sample));
        }
    }

    next
}

async fn probe_one(prober: &dyn Prober, ip: Ipv4Addr) -> PingSample {
    let timestamp = Utc::now();
    match prober.probe(ip).await {
        Ok(rtt) => PingSample::from_rtt(timestamp, rtt),
        Err(e) => {
            debug!("Probe of {ip} failed: {e}");
            PingSample::failure(timestamp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::HostStatus;
    use crate::ping_executor::ProbeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Replies with the last octet as RTT; hosts ending in 0 are down.
    struct OctetProber {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl OctetProber {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Prober for OctetProber {
        async fn probe(&self, ip: Ipv4Addr) -> Result<Duration, ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match ip.octets()[3] {
                0 => Err(ProbeError::Other("unreachable".into())),
                n => Ok(Duration::from_millis(u64::from(n))),
            }
        }
    }

    fn hosts(n: u8) -> Vec<Ipv4Addr> {
        (0..n).map(|i| Ipv4Addr::new(10, 0, 0, i)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_probes_are_bounded_by_batch_size() {
        let prober = OctetProber::new();
        let hosts = hosts(23);
        let next = run_cycle(&hosts, &HostStore::new(), &prober, 5, 50).await;
        assert_eq!(next.len(), 23);
        assert_eq!(prober.peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_error_only_affects_its_host() {
        let prober = OctetProber::new();
        let hosts = hosts(3);
        let next = run_cycle(&hosts, &HostStore::new(), &prober, 5, 50).await;

        let down = &next[&Ipv4Addr::new(10, 0, 0, 0)];
        assert_eq!(down.status, HostStatus::Offline);
        assert_eq!(down.total_sent, 1);

        let up = &next[&Ipv4Addr::new(10, 0, 0, 2)];
        assert_eq!(up.status, HostStatus::Online);
        assert_eq!(up.current_rtt_ms, Some(2.0));
    }

    #[tokio::test(start_paused = true)]
    async fn prior_records_are_advanced_and_keep_hostname() {
        let prober = OctetProber::new();
        let ip = Ipv4Addr::new(10, 0, 0, 7);
        let mut prior = HostStore::new();
        let mut record = HostRecord::new(ip, 50);
        record.merge_hostname(Some("seven.lan"));
        prior.insert(ip, record);

        let next = run_cycle(&[ip], &prior, &prober, 5, 50).await;
        let next = run_cycle(&[ip], &next, &prober, 5, 50).await;

        let record = &next[&ip];
        assert_eq!(record.total_sent, 2);
        assert_eq!(record.hostname.as_deref(), Some("seven.lan"));
        // prior is untouched
        assert_eq!(prior[&ip].total_sent, 0);
    }
}
