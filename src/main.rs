#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Arc;

use eframe::egui;
use egui::IconData;
use live_ping_monitor::dns_cache::{DnsResolver, HostnameResolver};
use live_ping_monitor::ping_executor::IcmpProber;
use live_ping_monitor::{AppConfig, LiveMonitor, LiveMonitorApp};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let config = AppConfig::load();
    let prober = Arc::new(IcmpProber::new(config.monitor.probe_timeout()));
    let resolver: Arc<dyn HostnameResolver> = Arc::new(DnsResolver::default());
    let monitor = LiveMonitor::new(
        config.monitor.clone(),
        prober,
        Some(resolver),
        runtime.handle().clone(),
    );
    let app = LiveMonitorApp::new(monitor, config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([600.0, 300.0])
            .with_icon(IconData::default()),
        ..Default::default()
    };
    eframe::run_native(
        "Live Ping Monitor",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )?;

    drop(runtime);
    Ok(())
}
