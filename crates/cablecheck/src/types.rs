//! Core types shared by the loaders, the reconciler and the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enrichment value used when a device has no asset record.
pub const DEFAULT_PLACEHOLDER: &str = "N/A";

/// Icon for nodes whose role could not be established.
pub const UNKNOWN_ICON: &str = "unknown";

/// Neighbor name recorded for sections without a `SysName`.
pub const UNKNOWN_NEIGHBOR: &str = "Unknown";

/// Out-of-band management interface, never a fabric link.
pub const MANAGEMENT_INTERFACE: &str = "eth0";

/// One side of a cable: a device and one of its ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    /// Device name.
    pub device: String,
    /// Local port name on that device.
    pub port: String,
}

impl Endpoint {
    pub fn new(device: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.port)
    }
}

/// Direction-agnostic identity of a cable.
///
/// The smaller endpoint is always stored first, so a link and its
/// endpoint-swapped form compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    low: Endpoint,
    high: Endpoint,
}

impl LinkKey {
    /// Creates the canonical key for a cable between `a` and `b`.
    pub fn new(a: Endpoint, b: Endpoint) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Lexicographically smaller endpoint.
    pub fn low(&self) -> &Endpoint {
        &self.low
    }

    /// Lexicographically larger endpoint.
    pub fn high(&self) -> &Endpoint {
        &self.high
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.low, self.high)
    }
}

/// One neighbor observation from a device's LLDP dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    /// Device that produced the dump.
    pub device: String,
    /// Local interface the neighbor was seen on.
    pub local_port: String,
    /// Reported neighbor system name, or [`UNKNOWN_NEIGHBOR`].
    pub neighbor: String,
    /// Reported neighbor port, possibly prefixed with the neighbor's name.
    pub neighbor_port: String,
}

impl Adjacency {
    pub fn new(
        device: impl Into<String>,
        local_port: impl Into<String>,
        neighbor: impl Into<String>,
        neighbor_port: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            local_port: local_port.into(),
            neighbor: neighbor.into(),
            neighbor_port: neighbor_port.into(),
        }
    }

    /// Returns true if the neighbor did not advertise a system name.
    pub fn has_unknown_neighbor(&self) -> bool {
        self.neighbor == UNKNOWN_NEIGHBOR
    }

    pub fn local_endpoint(&self) -> Endpoint {
        Endpoint::new(&self.device, &self.local_port)
    }

    pub fn neighbor_endpoint(&self) -> Endpoint {
        Endpoint::new(&self.neighbor, &self.neighbor_port)
    }
}

/// Returns true if `port` names one of the management interfaces.
pub fn is_management_port(port: &str, management: &[String]) -> bool {
    management.iter().any(|m| m.eq_ignore_ascii_case(port))
}

/// Graph-level documentation state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryState {
    /// Discovered and declared in the expected topology.
    Confirmed,
    /// Discovered but not declared.
    Failed,
    /// Declared but never discovered.
    Missing,
}

impl DiscoveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for DiscoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-facing cabling state of one device port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortStatus {
    /// Discovered neighbor matches the expectation exactly.
    Established,
    /// Expected, nothing discovered on the interface.
    Missing,
    /// Expected, but a different neighbor was discovered.
    Mismatch,
    /// Discovered with no expectation for the interface.
    Unexpected,
    /// Neither expected nor discovered.
    #[serde(rename = "No-Info")]
    NoInfo,
}

impl PortStatus {
    pub const ALL: [PortStatus; 5] = [
        PortStatus::Established,
        PortStatus::Missing,
        PortStatus::Mismatch,
        PortStatus::Unexpected,
        PortStatus::NoInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Established => "Established",
            Self::Missing => "Missing",
            Self::Mismatch => "Mismatch",
            Self::Unexpected => "Unexpected",
            Self::NoInfo => "No-Info",
        }
    }

    /// Health level shown next to the status in reports.
    pub fn health(&self) -> ConnectionHealth {
        match self {
            Self::Established => ConnectionHealth::Excellent,
            Self::Unexpected => ConnectionHealth::Warning,
            Self::Mismatch | Self::Missing => ConnectionHealth::Critical,
            Self::NoInfo => ConnectionHealth::Unknown,
        }
    }

    /// Returns true for states that need operator action.
    #[inline]
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Missing | Self::Mismatch)
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health level of a connection or of the whole fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionHealth {
    Excellent,
    Good,
    Warning,
    Critical,
    Unknown,
}

impl ConnectionHealth {
    /// Fabric-wide health from the share of established ports (percent).
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 95.0 {
            Self::Excellent
        } else if ratio >= 85.0 {
            Self::Good
        } else if ratio >= 70.0 {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ConnectionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_key_is_direction_agnostic() {
        let a = Endpoint::new("leaf01", "swp1");
        let b = Endpoint::new("spine01", "swp3");
        let forward = LinkKey::new(a.clone(), b.clone());
        let reverse = LinkKey::new(b, a.clone());
        assert_eq!(forward, reverse);
        assert_eq!(forward.low(), &a);
    }

    #[test]
    fn test_link_key_distinguishes_ports() {
        let k1 = LinkKey::new(Endpoint::new("a", "swp1"), Endpoint::new("b", "swp1"));
        let k2 = LinkKey::new(Endpoint::new("a", "swp1"), Endpoint::new("b", "swp2"));
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("leaf01", "swp1").to_string(), "leaf01:swp1");
    }

    #[test]
    fn test_management_port_case_insensitive() {
        let mgmt = vec!["eth0".to_string()];
        assert!(is_management_port("eth0", &mgmt));
        assert!(is_management_port("ETH0", &mgmt));
        assert!(!is_management_port("swp1", &mgmt));
    }

    #[test]
    fn test_port_status_health() {
        assert_eq!(PortStatus::Established.health(), ConnectionHealth::Excellent);
        assert_eq!(PortStatus::Unexpected.health(), ConnectionHealth::Warning);
        assert_eq!(PortStatus::Missing.health(), ConnectionHealth::Critical);
        assert_eq!(PortStatus::Mismatch.health(), ConnectionHealth::Critical);
        assert_eq!(PortStatus::NoInfo.health(), ConnectionHealth::Unknown);
    }

    #[test]
    fn test_health_from_ratio() {
        assert_eq!(ConnectionHealth::from_ratio(100.0), ConnectionHealth::Excellent);
        assert_eq!(ConnectionHealth::from_ratio(95.0), ConnectionHealth::Excellent);
        assert_eq!(ConnectionHealth::from_ratio(90.0), ConnectionHealth::Good);
        assert_eq!(ConnectionHealth::from_ratio(70.0), ConnectionHealth::Warning);
        assert_eq!(ConnectionHealth::from_ratio(0.0), ConnectionHealth::Critical);
    }

    #[test]
    fn test_discovery_state_serde() {
        let json = serde_json::to_string(&DiscoveryState::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        let json = serde_json::to_string(&PortStatus::NoInfo).unwrap();
        assert_eq!(json, "\"No-Info\"");
    }
}
