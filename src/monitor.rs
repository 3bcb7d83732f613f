use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use log::{info, warn};
use tokio::runtime::Handle;

use crate::config::MonitorConfig;
use crate::dns_cache::HostnameResolver;
use crate::error::Result;
use crate::export::{self, ExportFormat};
use crate::host_record::HostRecord;
use crate::hosts::expand_hosts;
use crate::ping_executor::Prober;
use crate::session::{MonitorSession, SessionState};

/// Entry point for the view layer: lifecycle control, snapshots and export.
pub struct LiveMonitor {
    session: MonitorSession,
}

impl LiveMonitor {
    pub fn new(
        config: MonitorConfig,
        prober: Arc<dyn Prober>,
        resolver: Option<Arc<dyn HostnameResolver>>,
        runtime: Handle,
    ) -> Self {
        Self {
            session: MonitorSession::new(config, prober, resolver, runtime),
        }
    }

    /// Expands `hosts_text` and starts monitoring the resulting hosts.
    pub fn start(&self, hosts_text: &str) -> Result<usize> {
        let hosts = expand_hosts(hosts_text, self.session.config().max_hosts)?;
        self.session.start(hosts)
    }

    pub fn start_hosts(&self, hosts: Vec<Ipv4Addr>) -> Result<usize> {
        self.session.start(hosts)
    }

    pub fn pause(&self) -> Result<SessionState> {
        self.session.pause()
    }

    pub fn resume(&self) -> Result<SessionState> {
        self.session.resume()
    }

    pub fn stop(&self) -> Result<SessionState> {
        self.session.stop()
    }

    pub fn clear(&self) -> Result<SessionState> {
        self.session.clear()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    pub fn snapshot(&self) -> Vec<HostRecord> {
        self.session.snapshot()
    }

    pub fn on_hostname_resolved(&self, ip: Ipv4Addr, hostname: Option<&str>) -> bool {
        self.session.on_hostname_resolved(ip, hostname)
    }

    pub fn export_text(&self) -> String {
        export::export_text(&self.snapshot(), Local::now())
    }

    pub fn export_csv(&self) -> Result<String> {
        export::export_csv(&self.snapshot())
    }

    /// Writes the current snapshot into `dir` under a timestamped file name.
    pub fn export_to_dir(&self, dir: &Path, format: ExportFormat) -> Result<PathBuf> {
        let now = Local::now();
        let path = dir.join(export::default_export_file_name(format, now));
        match export::write_export(&path, format, &self.snapshot(), now) {
            Ok(()) => {
                info!("Exported {} hosts to {}", self.session.host_count(), path.display());
                Ok(path)
            }
            Err(e) => {
                warn!("Export to {} failed: {e}", path.display());
                Err(e)
            }
        }
    }
}
