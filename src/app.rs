use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use egui::{Color32, Pos2, Sense, Stroke, Vec2};
use log::warn;

use crate::config::AppConfig;
use crate::export::ExportFormat;
use crate::host_record::HostRecord;
use crate::latency_color::{LatencyClass, LatencyThresholds};
use crate::monitor::LiveMonitor;
use crate::ping::HostStatus;
use crate::session::SessionState;

const SPARKLINE_SIZE: Vec2 = Vec2::new(140.0, 22.0);
const SPARKLINE_MIN_SCALE_MS: f64 = 100.0;
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct LiveMonitorApp {
    monitor: LiveMonitor,
    config: AppConfig,
    thresholds: LatencyThresholds,
    message: Option<(Color32, String)>,
}

impl LiveMonitorApp {
    pub fn new(monitor: LiveMonitor, config: AppConfig) -> Self {
        let thresholds = LatencyThresholds {
            good_ms: config.good_threshold_ms,
            warning_ms: config.warning_threshold_ms,
        };
        Self {
            monitor,
            config,
            thresholds,
            message: None,
        }
    }

    fn start(&mut self) {
        match self.monitor.start(&self.config.hosts_input) {
            Ok(count) => {
                self.message = Some((Color32::GRAY, format!("Monitoring {count} hosts")));
                if let Err(e) = self.config.save() {
                    warn!("Failed to save config: {e}");
                }
            }
            Err(e) => self.message = Some((Color32::RED, e.to_string())),
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let dir = dirs::download_dir()
            .or_else(dirs::document_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        self.message = Some(match self.monitor.export_to_dir(&dir, format) {
            Ok(path) => (Color32::GRAY, format!("Exported to {}", path.display())),
            Err(e) => (Color32::RED, e.to_string()),
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let state = self.monitor.state();
        let has_data = self.monitor.session().host_count() > 0;

        ui.horizontal(|ui| {
            if ui
                .add_enabled(state == SessionState::Idle, egui::Button::new("Start"))
                .clicked()
            {
                self.start();
            }
            if state == SessionState::Paused {
                if ui.button("Resume").clicked() {
                    let _ = self.monitor.resume();
                }
            } else if ui
                .add_enabled(state == SessionState::Running, egui::Button::new("Pause"))
                .clicked()
            {
                let _ = self.monitor.pause();
            }
            if ui
                .add_enabled(state != SessionState::Idle, egui::Button::new("Stop"))
                .clicked()
            {
                let _ = self.monitor.stop();
            }
            if ui.button("Clear").clicked() {
                let _ = self.monitor.clear();
                self.message = None;
            }
            ui.separator();
            if ui
                .add_enabled(has_data, egui::Button::new("Export TXT"))
                .clicked()
            {
                self.export(ExportFormat::Text);
            }
            if ui
                .add_enabled(has_data, egui::Button::new("Export CSV"))
                .clicked()
            {
                self.export(ExportFormat::Csv);
            }
            ui.separator();
            ui.label(format!("State: {state}"));
        });
    }

    fn host_table(&self, ui: &mut egui::Ui, hosts: &[HostRecord]) {
        let ms = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));

        egui::Grid::new("hosts")
            .striped(true)
            .num_columns(9)
            .show(ui, |ui| {
                for title in [
                    "", "IP", "Hostname", "RTT", "Avg", "Min", "Max", "Loss", "History",
                ] {
                    ui.strong(title);
                }
                ui.end_row();

                for host in hosts {
                    let class = LatencyClass::for_record(host, self.thresholds);
                    status_dot(ui, class.to_color32());
                    ui.monospace(host.ip.to_string());
                    ui.label(host.hostname.as_deref().unwrap_or("-"));
                    ui.colored_label(class.to_color32(), ms(host.current_rtt_ms));
                    ui.label(ms(host.avg_rtt_ms));
                    ui.label(ms(host.min_rtt_ms));
                    ui.label(ms(host.max_rtt_ms));
                    ui.label(format!(
                        "{:.1}% ({}/{})",
                        host.packet_loss_pct, host.total_received, host.total_sent
                    ));
                    self.sparkline(ui, host);
                    ui.end_row();
                }
            });
    }

    fn sparkline(&self, ui: &mut egui::Ui, host: &HostRecord) {
        let (rect, _) = ui.allocate_exact_size(SPARKLINE_SIZE, Sense::hover());
        let painter = ui.painter_at(rect);
        let points: Vec<Option<f64>> = host.recent_rtts().collect();
        if points.is_empty() {
            return;
        }

        let scale = points
            .iter()
            .flatten()
            .fold(SPARKLINE_MIN_SCALE_MS, |acc, &rtt| acc.max(rtt));
        let step = rect.width() / (host.history_capacity().max(2) - 1) as f32;
        let to_pos = |i: usize, rtt: f64| {
            Pos2::new(
                rect.left() + i as f32 * step,
                rect.bottom() - (rtt / scale) as f32 * rect.height(),
            )
        };

        let mut previous: Option<Pos2> = None;
        for (i, point) in points.iter().enumerate() {
            match point {
                Some(rtt) => {
                    let pos = to_pos(i, *rtt);
                    let color = LatencyClass::from_rtt(Some(*rtt), self.thresholds).to_color32();
                    if let Some(prev) = previous {
                        painter.line_segment([prev, pos], Stroke::new(1.5, color));
                    }
                    previous = Some(pos);
                }
                None => {
                    let x = rect.left() + i as f32 * step;
                    painter.line_segment(
                        [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                        Stroke::new(1.0, Color32::RED),
                    );
                    previous = None;
                }
            }
        }
    }
}

fn status_dot(ui: &mut egui::Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(12.0), Sense::hover());
    ui.painter().circle_filled(rect.center(), 5.0, color);
}

impl eframe::App for LiveMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let hosts = self.monitor.snapshot();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Live Ping Monitor");

            ui.label("Hosts (IPs, CIDR blocks or ranges, comma separated):");
            ui.add_enabled(
                self.monitor.state() == SessionState::Idle,
                egui::TextEdit::multiline(&mut self.config.hosts_input)
                    .desired_rows(2)
                    .desired_width(f32::INFINITY),
            );

            self.controls(ui);

            if let Some((color, message)) = &self.message {
                ui.colored_label(*color, message.as_str());
            }

            ui.separator();

            let online = hosts
                .iter()
                .filter(|h| h.status == HostStatus::Online)
                .count();
            ui.label(format!("{online}/{} hosts online", hosts.len()));

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.host_table(ui, &hosts);
            });
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
