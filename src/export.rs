//! Text and CSV renderings of a host snapshot, plus a file sink.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::host_record::HostRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

pub fn default_export_file_name(format: ExportFormat, now: DateTime<Local>) -> String {
    format!(
        "ping_monitor_{}.{}",
        now.format("%Y-%m-%dT%H-%M-%S"),
        format.extension()
    )
}

fn ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1} ms"))
}

pub fn export_text(hosts: &[HostRecord], generated_at: DateTime<Local>) -> String {
    let mut lines = vec![
        "Live Ping Monitor - Export".to_string(),
        "=".repeat(60),
        format!("Export Time: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Hosts: {}", hosts.len()),
        String::new(),
    ];

    for host in hosts {
        lines.push(format!("Host: {}", host.ip));
        if let Some(hostname) = &host.hostname {
            lines.push(format!("Hostname: {hostname}"));
        }
        lines.push(format!("Status: {}", host.status));
        lines.push(format!("Current RTT: {}", ms(host.current_rtt_ms)));
        lines.push(format!("Average RTT: {}", ms(host.avg_rtt_ms)));
        lines.push(format!("Min RTT: {}", ms(host.min_rtt_ms)));
        lines.push(format!("Max RTT: {}", ms(host.max_rtt_ms)));
        lines.push(format!("Packet Loss: {:.1}%", host.packet_loss_pct));
        lines.push(format!("Packets: {}/{}", host.total_received, host.total_sent));

        if !host.history.is_empty() {
            lines.push(format!("Recent Pings (last {}):", host.history.len()));
            for (i, sample) in host.history.iter().enumerate() {
                let time = sample.timestamp.with_timezone(&Local).format("%H:%M:%S");
                match sample.rtt_ms {
                    Some(rtt) if sample.success => {
                        lines.push(format!("  {:>2}. {time} {rtt:.1} ms", i + 1))
                    }
                    _ => lines.push(format!("  {:>2}. {time} TIMEOUT", i + 1)),
                }
            }
        }
        lines.push("-".repeat(40));
        lines.push(String::new());
    }

    lines.join("\n")
}

pub fn export_csv(hosts: &[HostRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record([
        "ip",
        "hostname",
        "status",
        "current_rtt_ms",
        "avg_rtt_ms",
        "min_rtt_ms",
        "max_rtt_ms",
        "packet_loss_pct",
        "total_sent",
        "total_received",
    ])?;

    let rtt = |v: Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_default();
    for host in hosts {
        writer.write_record([
            host.ip.to_string(),
            host.hostname.clone().unwrap_or_default(),
            host.status.to_string(),
            rtt(host.current_rtt_ms),
            rtt(host.avg_rtt_ms),
            rtt(host.min_rtt_ms),
            rtt(host.max_rtt_ms),
            format!("{:.1}", host.packet_loss_pct),
            host.total_sent.to_string(),
            host.total_received.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn render(
    format: ExportFormat,
    hosts: &[HostRecord],
    now: DateTime<Local>,
) -> Result<String> {
    match format {
        ExportFormat::Text => Ok(export_text(hosts, now)),
        ExportFormat::Csv => export_csv(hosts),
    }
}

/// Renders `hosts` and writes them to `path`.
pub fn write_export(
    path: &Path,
    format: ExportFormat,
    hosts: &[HostRecord],
    now: DateTime<Local>,
) -> Result<()> {
    let content = render(format, hosts, now)?;
    fs::write(path, content)?;
    Ok(())
}
