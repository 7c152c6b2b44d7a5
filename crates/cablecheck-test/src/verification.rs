//! Verification helpers for reconciled graphs and port reports

use std::collections::HashSet;

use fabric_cablecheck::{
    DeviceReport, DiscoveryState, Endpoint, LinkKey, PortStatus, TopologyGraph,
};
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Link {key} appears more than once")]
    DuplicateLink { key: String },

    #[error("Link {link} references node id {id} which does not exist")]
    DanglingLink { link: usize, id: usize },

    #[error("Link {link} endpoint label '{label}' does not match node '{node}'")]
    LabelMismatch {
        link: usize,
        label: String,
        node: String,
    },

    #[error("Expected {kind} id {expected} at position {expected}, found {actual}")]
    NonContiguousId {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Nodes are not sorted by name at position {position}")]
    Unsorted { position: usize },

    #[error("No link between {a} and {b}")]
    LinkNotFound { a: String, b: String },

    #[error("No classification for {device}:{port}")]
    PortNotFound { device: String, port: String },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Structural checks over a reconciled graph.
pub struct GraphVerifier<'a> {
    graph: &'a TopologyGraph,
}

impl<'a> GraphVerifier<'a> {
    pub fn new(graph: &'a TopologyGraph) -> Self {
        Self { graph }
    }

    /// No cable appears twice, in either orientation.
    pub fn assert_symmetric(&self) -> VerifyResult<()> {
        let mut seen = HashSet::new();
        for link in &self.graph.links {
            let key = link.key();
            if !seen.insert(key.clone()) {
                return Err(VerificationError::DuplicateLink {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Every link endpoint resolves to a node carrying the same device label.
    pub fn assert_complete(&self) -> VerifyResult<()> {
        for link in &self.graph.links {
            for (id, label) in [(link.source, &link.src_device), (link.target, &link.tgt_device)] {
                let node = self
                    .graph
                    .nodes
                    .get(id)
                    .ok_or(VerificationError::DanglingLink { link: link.id, id })?;
                if &node.name != label {
                    return Err(VerificationError::LabelMismatch {
                        link: link.id,
                        label: label.clone(),
                        node: node.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Nodes sorted by name, node and link ids equal to their positions.
    pub fn assert_compacted(&self) -> VerifyResult<()> {
        for (i, node) in self.graph.nodes.iter().enumerate() {
            if node.id != i {
                return Err(VerificationError::NonContiguousId {
                    kind: "node",
                    expected: i,
                    actual: node.id,
                });
            }
        }
        for pair in self.graph.nodes.windows(2).enumerate() {
            let (position, nodes) = pair;
            if nodes[0].name > nodes[1].name {
                return Err(VerificationError::Unsorted {
                    position: position + 1,
                });
            }
        }
        for (i, link) in self.graph.links.iter().enumerate() {
            if link.id != i {
                return Err(VerificationError::NonContiguousId {
                    kind: "link",
                    expected: i,
                    actual: link.id,
                });
            }
        }
        Ok(())
    }

    /// Runs every structural check.
    pub fn assert_well_formed(&self) -> VerifyResult<()> {
        self.assert_symmetric()?;
        self.assert_complete()?;
        self.assert_compacted()
    }

    /// Discovery state of the cable between two `device:port` endpoints.
    pub fn state_between(&self, a: &str, b: &str) -> VerifyResult<DiscoveryState> {
        let (ea, eb) = (endpoint(a), endpoint(b));
        let key = LinkKey::new(ea, eb);
        self.graph
            .links
            .iter()
            .find(|l| l.key() == key)
            .map(|l| l.state)
            .ok_or_else(|| VerificationError::LinkNotFound {
                a: a.to_string(),
                b: b.to_string(),
            })
    }
}

/// Status of one port across a set of device reports.
pub fn port_status(reports: &[DeviceReport], device: &str, port: &str) -> VerifyResult<PortStatus> {
    reports
        .iter()
        .filter(|r| r.device == device)
        .flat_map(|r| r.ports.iter())
        .find(|p| p.port == port)
        .map(|p| p.status)
        .ok_or_else(|| VerificationError::PortNotFound {
            device: device.to_string(),
            port: port.to_string(),
        })
}

/// Parses `device:port`.
pub fn endpoint(text: &str) -> Endpoint {
    match text.split_once(':') {
        Some((device, port)) => Endpoint::new(device, port),
        None => Endpoint::new(text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_cablecheck::{GraphLink, GraphNode};

    fn node(id: usize, name: &str) -> GraphNode {
        GraphNode {
            icon: "switch".to_string(),
            id,
            layer: 4,
            name: name.to_string(),
            primary_ip: "N/A".to_string(),
            mac: "N/A".to_string(),
            model: "N/A".to_string(),
            serial_number: "N/A".to_string(),
            version: "N/A".to_string(),
        }
    }

    fn link(id: usize, src: (usize, &str, &str), tgt: (usize, &str, &str)) -> GraphLink {
        GraphLink {
            id,
            source: src.0,
            target: tgt.0,
            src_device: src.1.to_string(),
            src_port: src.2.to_string(),
            tgt_device: tgt.1.to_string(),
            tgt_port: tgt.2.to_string(),
            state: DiscoveryState::Failed,
        }
    }

    #[test]
    fn test_detects_reversed_duplicate() {
        let graph = TopologyGraph {
            nodes: vec![node(0, "a"), node(1, "b")],
            links: vec![
                link(0, (0, "a", "swp1"), (1, "b", "swp2")),
                link(1, (1, "b", "swp2"), (0, "a", "swp1")),
            ],
        };
        let verifier = GraphVerifier::new(&graph);
        assert!(matches!(
            verifier.assert_symmetric(),
            Err(VerificationError::DuplicateLink { .. })
        ));
        assert!(verifier.assert_complete().is_ok());
    }

    #[test]
    fn test_detects_label_mismatch() {
        let graph = TopologyGraph {
            nodes: vec![node(0, "a"), node(1, "b")],
            links: vec![link(0, (1, "a", "swp1"), (0, "b", "swp2"))],
        };
        assert!(GraphVerifier::new(&graph).assert_complete().is_err());
    }

    #[test]
    fn test_state_between_either_orientation() {
        let graph = TopologyGraph {
            nodes: vec![node(0, "a"), node(1, "b")],
            links: vec![link(0, (0, "a", "swp1"), (1, "b", "swp2"))],
        };
        let verifier = GraphVerifier::new(&graph);
        assert_eq!(verifier.state_between("b:swp2", "a:swp1"), Ok(DiscoveryState::Failed));
        assert!(verifier.state_between("a:swp9", "b:swp2").is_err());
    }
}
