pub mod app;
pub mod config;
pub mod dns_cache;
pub mod error;
pub mod export;
pub mod host_record;
pub mod hosts;
pub mod latency_color;
pub mod monitor;
pub mod ping;
pub mod ping_executor;
pub mod runner;
pub mod session;

pub use app::LiveMonitorApp;
pub use config::{AppConfig, MonitorConfig};
pub use error::MonitorError;
pub use host_record::HostRecord;
pub use monitor::LiveMonitor;
pub use ping::{HostStatus, PingSample};
pub use session::{MonitorSession, SessionState};
