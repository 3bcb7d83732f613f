//! Monitoring session state machine and its cycle scheduler.
//!
//! A session moves between `Idle`, `Running` and `Paused`. While it is not
//! idle a single scheduler task runs probe cycles back to back, waiting the
//! configured interval after each cycle completes. Every `start`/`stop`
//! bumps the session epoch; a cycle only commits if the epoch it was
//! launched under is still current, so stale work from an earlier run can
//! never land in a later one.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

use futures::StreamExt;
use log::{debug, info, trace};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use crate::config::MonitorConfig;
use crate::dns_cache::HostnameResolver;
use crate::error::{MonitorError, Result};
use crate::host_record::HostRecord;
use crate::ping_executor::Prober;
use crate::runner::{HostStore, run_cycle};

const MAX_CONCURRENT_LOOKUPS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
        })
    }
}

/// Wake-ups for one run's scheduler. Replaced on every `start`.
#[derive(Default)]
struct Signals {
    resume: Notify,
    halt: Notify,
}

struct Inner {
    state: SessionState,
    hosts: Arc<[Ipv4Addr]>,
    epoch: u64,
    store: Arc<HostStore>,
    cycles_completed: u64,
    signals: Arc<Signals>,
}

struct Shared {
    inner: Mutex<Inner>,
    config: MonitorConfig,
    prober: Arc<dyn Prober>,
    resolver: Option<Arc<dyn HostnameResolver>>,
}

impl Shared {
    /// Publishes a finished cycle if it still belongs to the live epoch.
    fn commit(&self, epoch: u64, mut next: HostStore) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!(
                "Discarding cycle from epoch {epoch} (current epoch {})",
                inner.epoch
            );
            return false;
        }

        // Hostnames may have been resolved while the cycle was in flight.
        for (ip, record) in next.iter_mut() {
            if let Some(known) = inner.store.get(ip).and_then(|r| r.hostname.as_deref()) {
                record.merge_hostname(Some(known));
            }
        }

        inner.store = Arc::new(next);
        inner.cycles_completed += 1;
        trace!("Committed cycle {} for epoch {epoch}", inner.cycles_completed);
        true
    }

    fn merge_hostname(
        &self,
        expected_epoch: Option<u64>,
        ip: Ipv4Addr,
        hostname: Option<&str>,
    ) -> bool {
        let mut inner = self.inner.lock();
        if expected_epoch.is_some_and(|epoch| epoch != inner.epoch) {
            return false;
        }
        let needs_name = inner
            .store
            .get(&ip)
            .is_some_and(|record| record.hostname.is_none());
        if !needs_name || hostname.is_none_or(str::is_empty) {
            return false;
        }
        Arc::make_mut(&mut inner.store)
            .get_mut(&ip)
            .is_some_and(|record| record.merge_hostname(hostname))
    }
}

/// Owns the host store of one monitoring run and schedules its cycles.
pub struct MonitorSession {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl MonitorSession {
    pub fn new(
        config: MonitorConfig,
        prober: Arc<dyn Prober>,
        resolver: Option<Arc<dyn HostnameResolver>>,
        runtime: Handle,
    ) -> Self {
        let inner = Inner {
            state: SessionState::Idle,
            hosts: Arc::from(Vec::new()),
            epoch: 0,
            store: Arc::new(HostStore::new()),
            cycles_completed: 0,
            signals: Arc::new(Signals::default()),
        };
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                config: config.validated(),
                prober,
                resolver,
            }),
            runtime,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    pub fn epoch(&self) -> u64 {
        self.shared.inner.lock().epoch
    }

    pub fn host_count(&self) -> usize {
        self.shared.inner.lock().hosts.len()
    }

    /// Cycles committed since the current run started.
    pub fn cycles_completed(&self) -> u64 {
        self.shared.inner.lock().cycles_completed
    }

    /// Starts monitoring `hosts`. Only valid while idle.
    ///
    /// Hosts are deduplicated and sorted numerically once; that order is
    /// kept for the whole run. Returns the number of tracked hosts.
    pub fn start(&self, mut hosts: Vec<Ipv4Addr>) -> Result<usize> {
        hosts.sort_unstable();
        hosts.dedup();

        let max_hosts = self.shared.config.max_hosts;
        let (epoch, hosts, signals) = {
            let mut inner = self.shared.inner.lock();
            if inner.state != SessionState::Idle {
                return Err(rejected("start", inner.state));
            }
            if hosts.is_empty() {
                return Err(MonitorError::invalid_input("no hosts to monitor"));
            }
            if hosts.len() > max_hosts {
                return Err(MonitorError::invalid_input(format!(
                    "{} hosts given, at most {max_hosts} can be monitored at once",
                    hosts.len()
                )));
            }

            let capacity = self.shared.config.history_capacity;
            let store: HostStore = hosts
                .iter()
                .map(|&ip| (ip, HostRecord::new(ip, capacity)))
                .collect();

            inner.epoch += 1;
            inner.state = SessionState::Running;
            inner.hosts = Arc::from(hosts);
            inner.store = Arc::new(store);
            inner.cycles_completed = 0;
            inner.signals = Arc::new(Signals::default());
            (inner.epoch, Arc::clone(&inner.hosts), Arc::clone(&inner.signals))
        };

        info!("Monitoring started for {} hosts (epoch {epoch})", hosts.len());
        self.runtime.spawn(drive(Arc::clone(&self.shared), epoch, signals));
        self.spawn_hostname_resolution(epoch, &hosts);
        Ok(hosts.len())
    }

    /// Stops scheduling new cycles. An in-flight cycle still commits.
    pub fn pause(&self) -> Result<SessionState> {
        let mut inner = self.shared.inner.lock();
        if inner.state != SessionState::Running {
            return Err(rejected("pause", inner.state));
        }
        inner.state = SessionState::Paused;
        info!("Monitoring paused (epoch {})", inner.epoch);
        Ok(inner.state)
    }

    pub fn resume(&self) -> Result<SessionState> {
        let mut inner = self.shared.inner.lock();
        if inner.state != SessionState::Paused {
            return Err(rejected("resume", inner.state));
        }
        inner.state = SessionState::Running;
        inner.signals.resume.notify_one();
        info!("Monitoring resumed (epoch {})", inner.epoch);
        Ok(inner.state)
    }

    /// Ends the run. The store is kept for inspection and export.
    pub fn stop(&self) -> Result<SessionState> {
        let mut inner = self.shared.inner.lock();
        if inner.state == SessionState::Idle {
            return Err(rejected("stop", inner.state));
        }
        halt(&mut inner);
        info!("Monitoring stopped (epoch now {})", inner.epoch);
        Ok(inner.state)
    }

    /// Ends any run and forgets all hosts and their data. Valid in every state.
    pub fn clear(&self) -> Result<SessionState> {
        let mut inner = self.shared.inner.lock();
        halt(&mut inner);
        inner.hosts = Arc::from(Vec::new());
        inner.store = Arc::new(HostStore::new());
        inner.cycles_completed = 0;
        info!("Monitoring cleared (epoch now {})", inner.epoch);
        Ok(inner.state)
    }

    /// Records of the last committed cycle, in numeric IP order.
    pub fn snapshot(&self) -> Vec<HostRecord> {
        let (hosts, store) = {
            let inner = self.shared.inner.lock();
            (Arc::clone(&inner.hosts), Arc::clone(&inner.store))
        };
        hosts
            .iter()
            .filter_map(|ip| store.get(ip).cloned())
            .collect()
    }

    /// Applies a resolved hostname. A no-op if the host is not tracked, already
    /// has a name, or `hostname` is `None`. Returns whether the record changed.
    pub fn on_hostname_resolved(&self, ip: Ipv4Addr, hostname: Option<&str>) -> bool {
        self.shared.merge_hostname(None, ip, hostname)
    }

    fn spawn_hostname_resolution(&self, epoch: u64, hosts: &Arc<[Ipv4Addr]>) {
        let Some(resolver) = self.shared.resolver.clone() else {
            return;
        };
        if !self.shared.config.resolve_hostnames {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let hosts = Arc::clone(hosts);
        self.runtime.spawn(async move {
            futures::stream::iter(hosts.iter().copied())
                .for_each_concurrent(MAX_CONCURRENT_LOOKUPS, |ip| {
                    let resolver = Arc::clone(&resolver);
                    let shared = Arc::clone(&shared);
                    async move {
                        match resolver.resolve(ip).await {
                            Some(hostname) => {
                                if shared.merge_hostname(Some(epoch), ip, Some(&hostname)) {
                                    debug!("Resolved {ip} to {hostname}");
                                }
                            }
                            None => trace!("No hostname for {ip}"),
                        }
                    }
                })
                .await;
        });
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        halt(&mut self.shared.inner.lock());
    }
}

fn halt(inner: &mut Inner) {
    inner.epoch += 1;
    inner.state = SessionState::Idle;
    inner.signals.halt.notify_one();
}

fn rejected(operation: &'static str, state: SessionState) -> MonitorError {
    debug!("Rejected {operation} while {state}");
    MonitorError::InvalidTransition { operation, state }
}

/// Scheduler for one run. Exits once the session epoch moves past `epoch`.
async fn drive(shared: Arc<Shared>, epoch: u64, signals: Arc<Signals>) {
    let interval = shared.config.cycle_interval();
    let batch_size = shared.config.batch_size;
    let history_capacity = shared.config.history_capacity;

    loop {
        let next_cycle = {
            let inner = shared.inner.lock();
            if inner.epoch != epoch {
                return;
            }
            match inner.state {
                SessionState::Running => {
                    Some((Arc::clone(&inner.hosts), Arc::clone(&inner.store)))
                }
                SessionState::Paused => None,
                SessionState::Idle => return,
            }
        };

        let Some((hosts, prior)) = next_cycle else {
            tokio::select! {
                _ = signals.resume.notified() => {}
                _ = signals.halt.notified() => return,
            }
            continue;
        };

        let next = run_cycle(
            &hosts,
            &prior,
            shared.prober.as_ref(),
            batch_size,
            history_capacity,
        )
        .await;
        if !shared.commit(epoch, next) {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = signals.halt.notified() => return,
        }
    }
}
