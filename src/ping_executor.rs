use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, IcmpPacket, PingIdentifier, PingSequence, SurgeError};
use thiserror::Error;
use tokio::sync::OnceCell;

/// Why a single probe produced no reply. Always folded as a failed sample.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("could not open ICMP socket: {0}")]
    Socket(String),
    #[error("probe failed: {0}")]
    Other(String),
}

impl From<SurgeError> for ProbeError {
    fn from(err: SurgeError) -> Self {
        ProbeError::Other(err.to_string())
    }
}

/// One round-trip probe against one host.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Returns the round-trip time of a successful probe.
    async fn probe(&self, ip: Ipv4Addr) -> Result<Duration, ProbeError>;
}

/// ICMP echo prober sharing one socket client across all probes.
pub struct IcmpProber {
    client: OnceCell<Client>,
    timeout: Duration,
    next_identifier: AtomicU16,
    next_sequence: AtomicU16,
}

impl IcmpProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: OnceCell::new(),
            timeout,
            next_identifier: AtomicU16::new(1),
            next_sequence: AtomicU16::new(0),
        }
    }

    async fn client(&self) -> Result<&Client, ProbeError> {
        self.client
            .get_or_try_init(|| async {
                Client::new(&Config::default()).map_err(|e| ProbeError::Socket(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, ip: Ipv4Addr) -> Result<Duration, ProbeError> {
        let client = self.client().await?;
        let identifier = self.next_identifier.fetch_add(1, Ordering::Relaxed);
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);

        let mut pinger = client
            .pinger(IpAddr::V4(ip), PingIdentifier(identifier))
            .await;
        pinger.timeout(self.timeout);

        match pinger.ping(PingSequence(sequence), &[0; 16]).await {
            Ok((IcmpPacket::V4(_), rtt)) | Ok((IcmpPacket::V6(_), rtt)) => Ok(rtt),
            Err(SurgeError::Timeout { .. }) => Err(ProbeError::Timeout(self.timeout)),
            Err(e) => Err(e.into()),
        }
    }
}
