//! Per-port classification
//!
//! Each device port is classified against the expected topology:
//!
//! | expectation | discovery            | status      |
//! |-------------|----------------------|-------------|
//! | no          | no                   | No-Info     |
//! | yes         | no                   | Missing     |
//! | yes         | matches exactly      | Established |
//! | yes         | different neighbor   | Mismatch    |
//! | no          | yes                  | Unexpected  |
//!
//! Unlike the graph, this view is per device and is not deduplicated across
//! the two ends of a cable.

use serde::Serialize;
use std::collections::HashSet;

use crate::normalize::KnownDevices;
use crate::types::{is_management_port, Adjacency, ConnectionHealth, Endpoint, PortStatus};

/// Classification of one device port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortClassification {
    pub device: String,
    pub port: String,
    pub status: PortStatus,
    /// Declared neighbor, if any.
    pub expected: Option<Endpoint>,
    /// Discovered neighbor with its port normalized, if any.
    pub actual: Option<Endpoint>,
}

impl PortClassification {
    pub fn health(&self) -> ConnectionHealth {
        self.status.health()
    }
}

/// Classifies one port. Rules are evaluated in order, first match wins.
pub fn classify_port(expected: Option<&Endpoint>, actual: Option<&Endpoint>) -> PortStatus {
    match (expected, actual) {
        (None, None) => PortStatus::NoInfo,
        (Some(_), None) => PortStatus::Missing,
        (Some(e), Some(a)) if e == a => PortStatus::Established,
        (Some(_), Some(_)) => PortStatus::Mismatch,
        (None, Some(_)) => PortStatus::Unexpected,
    }
}

/// Classifies every port of one device.
///
/// Emits one classification per expectation, in the given order, followed by
/// one `Unexpected` classification per discovered interface without an
/// expectation, in dump order. Management interfaces are never reported as
/// unexpected. When an interface reports several neighbors, the first one is
/// used.
pub fn classify_device(
    device: &str,
    adjacencies: &[Adjacency],
    expectations: &[(String, Endpoint)],
    known: &KnownDevices,
    management: &[String],
) -> Vec<PortClassification> {
    let discovered_on = |port: &str| -> Option<Endpoint> {
        adjacencies
            .iter()
            .find(|a| a.local_port == port)
            .map(|a| Endpoint::new(&a.neighbor, known.normalize(&a.neighbor_port)))
    };

    let mut out = Vec::with_capacity(expectations.len());
    let mut expected_ports = HashSet::new();

    for (port, expected) in expectations {
        expected_ports.insert(port.as_str());
        let actual = discovered_on(port);
        out.push(PortClassification {
            device: device.to_string(),
            port: port.clone(),
            status: classify_port(Some(expected), actual.as_ref()),
            expected: Some(expected.clone()),
            actual,
        });
    }

    let mut reported = HashSet::new();
    for adjacency in adjacencies {
        let port = adjacency.local_port.as_str();
        let actual_port = known.normalize(&adjacency.neighbor_port);
        if expected_ports.contains(port)
            || is_management_port(port, management)
            || is_management_port(actual_port, management)
            || !reported.insert(port)
        {
            continue;
        }
        let actual = Endpoint::new(&adjacency.neighbor, actual_port);
        out.push(PortClassification {
            device: device.to_string(),
            port: port.to_string(),
            status: classify_port(None, Some(&actual)),
            expected: None,
            actual: Some(actual),
        });
    }

    out
}
