use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, trace};
use parking_lot::Mutex;

const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Best-effort reverse lookup. `None` means unresolved.
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    async fn resolve(&self, ip: Ipv4Addr) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct DnsCacheEntry {
    hostname: Option<String>,
    cached_at: Instant,
    ttl: Duration,
}

impl DnsCacheEntry {
    pub fn new(hostname: Option<String>, ttl: Duration) -> Self {
        Self {
            hostname,
            cached_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
}

/// Reverse lookup results keyed by address, including negative answers.
#[derive(Debug, Default)]
pub struct DnsCache {
    cache: HashMap<Ipv4Addr, DnsCacheEntry>,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ip: Ipv4Addr, entry: DnsCacheEntry) {
        self.cache.insert(ip, entry);
    }

    /// `Some(answer)` for a live entry, `None` if absent or expired.
    pub fn get_valid(&self, ip: Ipv4Addr) -> Option<Option<&str>> {
        self.cache
            .get(&ip)
            .filter(|entry| !entry.is_expired())
            .map(DnsCacheEntry::hostname)
    }

    pub fn clean_expired(&mut self) {
        self.cache.retain(|_, entry| !entry.is_expired());
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// System reverse DNS with a per-address TTL cache.
pub struct DnsResolver {
    cache: Mutex<DnsCache>,
    ttl: Duration,
    lookup_timeout: Duration,
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS), DEFAULT_LOOKUP_TIMEOUT)
    }
}

impl DnsResolver {
    pub fn new(ttl: Duration, lookup_timeout: Duration) -> Self {
        Self {
            cache: Mutex::new(DnsCache::new()),
            ttl,
            lookup_timeout,
        }
    }

    fn reverse_lookup(ip: Ipv4Addr) -> Option<String> {
        match dns_lookup::lookup_addr(&IpAddr::V4(ip)) {
            // Some resolvers echo the address back when there is no PTR record.
            Ok(hostname) if hostname != ip.to_string() => Some(hostname),
            Ok(_) => None,
            Err(e) => {
                trace!("Reverse lookup for {ip} failed: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl HostnameResolver for DnsResolver {
    async fn resolve(&self, ip: Ipv4Addr) -> Option<String> {
        let cached = self
            .cache
            .lock()
            .get_valid(ip)
            .map(|hostname| hostname.map(str::to_string));
        if let Some(hostname) = cached {
            return hostname;
        }

        let lookup = tokio::task::spawn_blocking(move || Self::reverse_lookup(ip));
        let hostname = match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(hostname)) => hostname,
            Ok(Err(e)) => {
                debug!("Reverse lookup worker for {ip} failed: {e}");
                return None;
            }
            // Not cached: a slow resolver may answer next time.
            Err(_) => return None,
        };

        let mut cache = self.cache.lock();
        cache.clean_expired();
        cache.insert(ip, DnsCacheEntry::new(hostname.clone(), self.ttl));
        hostname
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_returns_negative_answers() {
        let mut cache = DnsCache::new();
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        cache.insert(ip, DnsCacheEntry::new(None, Duration::from_secs(60)));
        assert_eq!(cache.get_valid(ip), Some(None));
        assert_eq!(cache.get_valid(Ipv4Addr::new(10, 0, 0, 2)), None);
    }

    #[test]
    fn expired_entries_are_ignored_and_cleaned() {
        let mut cache = DnsCache::new();
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        cache.insert(ip, DnsCacheEntry::new(Some("a".into()), Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get_valid(ip), None);
        cache.clean_expired();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn cached_answer_skips_lookup() {
        let resolver = DnsResolver::default();
        let ip = Ipv4Addr::new(192, 0, 2, 7);
        resolver.cache.lock().insert(
            ip,
            DnsCacheEntry::new(Some("test.example".into()), Duration::from_secs(60)),
        );
        assert_eq!(resolver.resolve(ip).await.as_deref(), Some("test.example"));
    }
}
