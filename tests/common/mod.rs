//! Scripted probe and resolver fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use live_ping_monitor::dns_cache::HostnameResolver;
use live_ping_monitor::ping_executor::{ProbeError, Prober};
use live_ping_monitor::{LiveMonitor, MonitorConfig, MonitorSession};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

pub fn ip(text: &str) -> Ipv4Addr {
    text.parse().unwrap()
}

/// Replies from a per-host script; hosts without a script (or whose script
/// ran out) reply with `default_rtt_ms`.
pub struct ScriptedProber {
    scripts: Mutex<HashMap<Ipv4Addr, VecDeque<Option<u64>>>>,
    default_rtt_ms: Option<u64>,
    gated: Mutex<HashSet<Ipv4Addr>>,
    gate: Semaphore,
    pub calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new(default_rtt_ms: Option<u64>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            default_rtt_ms,
            gated: Mutex::new(HashSet::new()),
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    /// Queues replies for `ip`; `None` is a lost probe.
    pub fn script(&self, ip: Ipv4Addr, replies: &[Option<u64>]) {
        self.scripts
            .lock()
            .entry(ip)
            .or_default()
            .extend(replies.iter().copied());
    }

    /// Probes of `ip` block until [`ScriptedProber::release`] is called.
    pub fn hold(&self, ip: Ipv4Addr) {
        self.gated.lock().insert(ip);
    }

    pub fn release(&self, probes: usize) {
        self.gate.add_permits(probes);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, ip: Ipv4Addr) -> Result<Duration, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gated = self.gated.lock().contains(&ip);
        if gated {
            self.gate
                .acquire()
                .await
                .map_err(|e| ProbeError::Other(e.to_string()))?
                .forget();
        }

        let reply = self
            .scripts
            .lock()
            .get_mut(&ip)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.default_rtt_ms);
        tokio::time::sleep(Duration::from_millis(1)).await;
        reply
            .map(Duration::from_millis)
            .ok_or_else(|| ProbeError::Timeout(Duration::from_millis(1000)))
    }
}

/// Resolves from a fixed table after a delay.
pub struct TableResolver {
    names: HashMap<Ipv4Addr, String>,
    delay: Duration,
}

impl TableResolver {
    pub fn new(names: &[(&str, &str)], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            names: names
                .iter()
                .map(|(addr, name)| (ip(addr), name.to_string()))
                .collect(),
            delay,
        })
    }
}

#[async_trait]
impl HostnameResolver for TableResolver {
    async fn resolve(&self, ip: Ipv4Addr) -> Option<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.names.get(&ip).cloned()
    }
}

pub fn session(prober: Arc<ScriptedProber>) -> MonitorSession {
    MonitorSession::new(MonitorConfig::default(), prober, None, Handle::current())
}

pub fn monitor(prober: Arc<ScriptedProber>) -> LiveMonitor {
    LiveMonitor::new(MonitorConfig::default(), prober, None, Handle::current())
}

/// Sleeps in small steps until `session` has committed `cycles` cycles.
pub async fn wait_for_cycles(session: &MonitorSession, cycles: u64) {
    for _ in 0..10_000 {
        if session.cycles_completed() >= cycles {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "timed out waiting for {cycles} cycles (got {})",
        session.cycles_completed()
    );
}

/// Lets spawned tasks run without advancing past the next cycle.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
