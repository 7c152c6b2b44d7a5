//! Per-port report, status summaries and anomaly detection

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

use crate::classify::PortClassification;
use crate::reconcile::ReconcileStats;
use crate::types::{ConnectionHealth, PortStatus};

/// Width of the per-device banner line.
pub const BANNER_WIDTH: usize = 96;

const RULE_WIDTH: usize = 113;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M";
const ABSENT: &str = "None";

/// Classifications of one device, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub ports: Vec<PortClassification>,
}

impl DeviceReport {
    pub fn new(device: impl Into<String>, ports: Vec<PortClassification>) -> Self {
        Self {
            device: device.into(),
            ports,
        }
    }

    pub fn count(&self, status: PortStatus) -> usize {
        self.ports.iter().filter(|p| p.status == status).count()
    }

    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            device: self.device.clone(),
            total: self.ports.len(),
            established: self.count(PortStatus::Established),
            missing: self.count(PortStatus::Missing),
            mismatch: self.count(PortStatus::Mismatch),
            unexpected: self.count(PortStatus::Unexpected),
            no_info: self.count(PortStatus::NoInfo),
        }
    }
}

/// Port counts per status for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub device: String,
    pub total: usize,
    pub established: usize,
    pub missing: usize,
    pub mismatch: usize,
    pub unexpected: usize,
    pub no_info: usize,
}

/// Fabric-wide port counts and health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FabricSummary {
    pub total_devices: usize,
    pub total_ports: usize,
    pub established: usize,
    pub missing: usize,
    pub mismatch: usize,
    pub unexpected: usize,
    /// Established ports as a percentage of all classified ports.
    pub health_ratio: f64,
    pub health: ConnectionHealth,
}

impl FabricSummary {
    pub fn from_devices(devices: &[DeviceSummary]) -> Self {
        let total_ports: usize = devices.iter().map(|d| d.total).sum();
        let established: usize = devices.iter().map(|d| d.established).sum();
        let health_ratio = if total_ports > 0 {
            established as f64 / total_ports as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_devices: devices.len(),
            total_ports,
            established,
            missing: devices.iter().map(|d| d.missing).sum(),
            mismatch: devices.iter().map(|d| d.mismatch).sum(),
            unexpected: devices.iter().map(|d| d.unexpected).sum(),
            health_ratio,
            health: ConnectionHealth::from_ratio(health_ratio),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    MissingConnection,
    ConnectionMismatch,
    UnexpectedConnections,
}

/// Cabling problem that needs operator attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub device: String,
    pub interface: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub message: String,
    pub action: String,
}

/// Collects anomalies: one critical entry per missing or mismatched port and
/// one warning per device with at least `unexpected_threshold` unexpected
/// ports.
pub fn detect_anomalies(reports: &[DeviceReport], unexpected_threshold: usize) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for report in reports {
        for port in report.ports.iter().filter(|p| p.status.is_problem()) {
            let expected = display_endpoint(port.expected.as_ref());
            let (kind, message, action) = match port.status {
                PortStatus::Missing => (
                    AnomalyKind::MissingConnection,
                    format!("Expected connection to {expected} is missing"),
                    "Check physical cabling and LLDP daemon status on both devices",
                ),
                _ => (
                    AnomalyKind::ConnectionMismatch,
                    format!(
                        "Connection mismatch: Expected {expected}, Found {}",
                        display_endpoint(port.actual.as_ref())
                    ),
                    "Verify physical cabling matches topology documentation",
                ),
            };
            anomalies.push(Anomaly {
                device: report.device.clone(),
                interface: port.port.clone(),
                severity: Severity::Critical,
                kind,
                message,
                action: action.to_string(),
            });
        }

        let unexpected = report.count(PortStatus::Unexpected);
        if unexpected_threshold > 0 && unexpected >= unexpected_threshold {
            anomalies.push(Anomaly {
                device: report.device.clone(),
                interface: "multiple".to_string(),
                severity: Severity::Warning,
                kind: AnomalyKind::UnexpectedConnections,
                message: format!("Found {unexpected} unexpected LLDP connections"),
                action: "Review topology documentation and update expected connections"
                    .to_string(),
            });
        }
    }

    anomalies
}

fn display_endpoint(endpoint: Option<&crate::types::Endpoint>) -> String {
    endpoint.map_or_else(|| ABSENT.to_string(), |e| e.to_string())
}

/// Device banner centered in a line of `=`, padded to [`BANNER_WIDTH`].
pub fn banner(device: &str) -> String {
    let side = "=".repeat(BANNER_WIDTH.saturating_sub(device.len() + 2) / 2);
    let mut line = format!("{side} {device} {side}");
    while line.len() < BANNER_WIDTH {
        line.push('=');
    }
    line
}

/// Renders the fixed-column per-port report.
pub fn render_report(reports: &[DeviceReport], created: DateTime<Local>) -> String {
    PortReport { reports, created }.to_string()
}

/// Per-port report layout, one banner and table per device.
struct PortReport<'a> {
    reports: &'a [DeviceReport],
    created: DateTime<Local>,
}

impl fmt::Display for PortReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(f, "Created on {}\n", self.created.format(TIMESTAMP_FORMAT))?;

        for report in self.reports {
            writeln!(f, "{}\n", banner(&report.device))?;
            writeln!(f, "{rule}")?;
            writeln!(
                f,
                "{:<10} {:<10} {:<28} {:<16} {:<28} {}",
                "Port", "Status", "Exp-Nbr", "Exp-Nbr-Port", "Act-Nbr", "Act-Nbr-Port"
            )?;
            writeln!(f, "{rule}")?;
            for port in &report.ports {
                let (exp_dev, exp_port) = split_endpoint(port.expected.as_ref());
                let (act_dev, act_port) = split_endpoint(port.actual.as_ref());
                writeln!(
                    f,
                    "{:<10} {:<10} {:<28} {:<16} {:<28} {}",
                    port.port,
                    port.status.as_str(),
                    exp_dev,
                    exp_port,
                    act_dev,
                    act_port
                )?;
            }
            f.write_str("\n\n")?;
        }
        Ok(())
    }
}

fn split_endpoint(endpoint: Option<&crate::types::Endpoint>) -> (&str, &str) {
    endpoint.map_or((ABSENT, ABSENT), |e| (e.device.as_str(), e.port.as_str()))
}

/// Machine-readable run summary for alerting consumers.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryDocument {
    pub generated_at: DateTime<Local>,
    pub summary: FabricSummary,
    pub devices: Vec<DeviceSummary>,
    pub anomalies: Vec<Anomaly>,
    pub topology: ReconcileStats,
}

impl SummaryDocument {
    pub fn new(
        reports: &[DeviceReport],
        topology: ReconcileStats,
        unexpected_threshold: usize,
        generated_at: DateTime<Local>,
    ) -> Self {
        let devices: Vec<DeviceSummary> = reports.iter().map(DeviceReport::summary).collect();
        Self {
            generated_at,
            summary: FabricSummary::from_devices(&devices),
            devices,
            anomalies: detect_anomalies(reports, unexpected_threshold),
            topology,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Endpoint;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn port(
        name: &str,
        status: PortStatus,
        expected: Option<(&str, &str)>,
        actual: Option<(&str, &str)>,
    ) -> PortClassification {
        PortClassification {
            device: "leaf01".to_string(),
            port: name.to_string(),
            status,
            expected: expected.map(|(d, p)| Endpoint::new(d, p)),
            actual: actual.map(|(d, p)| Endpoint::new(d, p)),
        }
    }

    fn sample() -> DeviceReport {
        DeviceReport::new(
            "leaf01",
            vec![
                port("swp51", PortStatus::Established, Some(("spine01", "swp1")), Some(("spine01", "swp1"))),
                port("swp52", PortStatus::Missing, Some(("spine02", "swp1")), None),
                port("swp53", PortStatus::Mismatch, Some(("spine03", "swp1")), Some(("spine04", "swp7"))),
                port("swp10", PortStatus::Unexpected, None, Some(("server07", "eth1"))),
            ],
        )
    }

    #[test]
    fn test_banner_width() {
        let line = banner("leaf01");
        assert_eq!(line.len(), BANNER_WIDTH);
        assert!(line.contains(" leaf01 "));
        assert_eq!(banner("spine1").len(), BANNER_WIDTH);
        assert_eq!(banner("leaf1").len(), BANNER_WIDTH);
    }

    #[test]
    fn test_render_report() {
        let created = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let text = render_report(&[sample()], created);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Created on 2024-03-05 14-07");
        assert!(lines[2].contains(" leaf01 "));
        assert!(lines[5].starts_with("Port       Status     Exp-Nbr"));
        assert_eq!(
            lines[7],
            format!("{:<10} {:<10} {:<28} {:<16} {:<28} {}", "swp51", "Established", "spine01", "swp1", "spine01", "swp1")
        );
        assert!(lines[8].starts_with("swp52      Missing"));
        assert!(lines[8].ends_with("None"));
        assert!(lines[10].contains("server07"));
    }

    #[test]
    fn test_device_and_fabric_summary() {
        let summary = sample().summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.established, 1);
        assert_eq!(summary.unexpected, 1);

        let fabric = FabricSummary::from_devices(&[summary]);
        assert_eq!(fabric.health_ratio, 25.0);
        assert_eq!(fabric.health, ConnectionHealth::Critical);
    }

    #[test]
    fn test_empty_fabric_summary() {
        let fabric = FabricSummary::from_devices(&[]);
        assert_eq!(fabric.total_ports, 0);
        assert_eq!(fabric.health_ratio, 0.0);
    }

    #[test]
    fn test_detect_anomalies() {
        let anomalies = detect_anomalies(&[sample()], 3);
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].kind, AnomalyKind::MissingConnection);
        assert_eq!(anomalies[0].message, "Expected connection to spine02:swp1 is missing");
        assert_eq!(anomalies[1].kind, AnomalyKind::ConnectionMismatch);
        assert_eq!(
            anomalies[1].message,
            "Connection mismatch: Expected spine03:swp1, Found spine04:swp7"
        );
    }

    #[test]
    fn test_unexpected_threshold_warning() {
        let anomalies = detect_anomalies(&[sample()], 1);
        let warning = anomalies.last().unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.interface, "multiple");
        assert_eq!(warning.message, "Found 1 unexpected LLDP connections");
    }

    #[test]
    fn test_summary_document_json() {
        let created = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let doc = SummaryDocument::new(&[sample()], ReconcileStats::default(), 3, created);
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["total_ports"], 4);
        assert_eq!(json["summary"]["health"], "critical");
        assert_eq!(json["anomalies"][0]["type"], "missing_connection");
        assert_eq!(json["devices"][0]["device"], "leaf01");
    }
}
