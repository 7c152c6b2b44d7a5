//! Expected topology loading
//!
//! The expected topology is a Graphviz-style edge list:
//!
//! ```text
//! graph G {
//!   "leaf01:swp51" -- "spine01:swp1"
//!   "leaf01":"swp52" -- "spine02":"swp1" [color=red]
//! }
//! ```
//!
//! Bracketed annotations are ignored. Lines that are not edges are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::input::read_optional;
use crate::types::{Endpoint, LinkKey};

static ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[.*?\]").expect("Invalid regex pattern"));

/// One declared cable, endpoints in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpectedLink {
    pub a: Endpoint,
    pub b: Endpoint,
}

impl ExpectedLink {
    pub fn new(a: Endpoint, b: Endpoint) -> Self {
        Self { a, b }
    }

    /// Direction-agnostic key of this link.
    pub fn key(&self) -> LinkKey {
        LinkKey::new(self.a.clone(), self.b.clone())
    }

    /// Parses one edge line. Returns `None` for anything that is not an edge.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = ANNOTATION_RE.replace_all(line, "");
        let line = line.trim().trim_end_matches(';').trim();
        let (left, right) = line.split_once("--")?;
        Some(Self::new(parse_endpoint(left)?, parse_endpoint(right)?))
    }
}

fn parse_endpoint(side: &str) -> Option<Endpoint> {
    let side = side.replace('"', "");
    let (device, port) = side.trim().split_once(':')?;
    let (device, port) = (device.trim(), port.trim());
    if device.is_empty() || port.is_empty() {
        return None;
    }
    if device.contains(char::is_whitespace) || port.contains(char::is_whitespace) {
        return None;
    }
    Some(Endpoint::new(device, port))
}

/// Declared cabling, as an ordered, literal-deduplicated link list.
#[derive(Debug, Clone, Default)]
pub struct ExpectedTopology {
    links: Vec<ExpectedLink>,
    keys: HashSet<LinkKey>,
}

impl ExpectedTopology {
    /// Parses the expected topology text.
    pub fn parse(text: &str) -> Self {
        let mut topology = Self::default();
        let mut literal = HashSet::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if !trimmed.contains("--") || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }
            match ExpectedLink::from_line(trimmed) {
                Some(link) => {
                    if literal.insert(link.clone()) {
                        topology.keys.insert(link.key());
                        topology.links.push(link);
                    }
                }
                None => debug!(line = trimmed, "Ignoring unparsable topology line"),
            }
        }

        topology
    }

    /// Loads the expected topology. An absent file yields an empty topology.
    pub fn load(path: &Path) -> Self {
        let topology = read_optional(path)
            .map(|text| Self::parse(&text))
            .unwrap_or_default();
        info!(links = topology.len(), "Loaded expected topology");
        topology
    }

    /// Declared links in declaration order.
    pub fn links(&self) -> &[ExpectedLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns true if the cable is declared in either orientation.
    pub fn contains(&self, key: &LinkKey) -> bool {
        self.keys.contains(key)
    }

    /// Expectations for one device as (local port, expected neighbor) pairs,
    /// in declaration order, from both orientations of each link.
    ///
    /// A link declared once per direction yields a single expectation.
    pub fn expectations_for(&self, device: &str) -> Vec<(String, Endpoint)> {
        let mut out: Vec<(String, Endpoint)> = Vec::new();
        for link in &self.links {
            for (local, remote) in [(&link.a, &link.b), (&link.b, &link.a)] {
                if local.device != device {
                    continue;
                }
                let entry = (local.port.clone(), remote.clone());
                if !out.contains(&entry) {
                    out.push(entry);
                }
            }
        }
        out
    }

    /// Every device named by a declared link.
    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.links
            .iter()
            .flat_map(|l| [l.a.device.as_str(), l.b.device.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPOLOGY: &str = r#"graph G {
  "leaf01:swp51" -- "spine01:swp1"
  "leaf01":"swp52" -- "spine02":"swp1" [color=red, label="uplink"]
  "spine01:swp1" -- "leaf01:swp51"
  "leaf01:swp51" -- "spine01:swp1"
  # "leaf09:swp1" -- "spine09:swp1"
  "broken" -- "spine01:swp2"
}"#;

    #[test]
    fn test_parse_edges() {
        let topo = ExpectedTopology::parse(TOPOLOGY);
        assert_eq!(topo.len(), 3);
        assert_eq!(
            topo.links()[0],
            ExpectedLink::new(
                Endpoint::new("leaf01", "swp51"),
                Endpoint::new("spine01", "swp1")
            )
        );
        assert_eq!(topo.links()[1].b, Endpoint::new("spine02", "swp1"));
    }

    #[test]
    fn test_contains_either_orientation() {
        let topo = ExpectedTopology::parse(TOPOLOGY);
        let key = LinkKey::new(
            Endpoint::new("spine02", "swp1"),
            Endpoint::new("leaf01", "swp52"),
        );
        assert!(topo.contains(&key));
    }

    #[test]
    fn test_annotations_ignored() {
        let link = ExpectedLink::from_line(r#""a:swp1" -- "b:swp2" [style="dashed"];"#).unwrap();
        assert_eq!(link.a, Endpoint::new("a", "swp1"));
        assert_eq!(link.b, Endpoint::new("b", "swp2"));
    }

    #[test]
    fn test_expectations_for_device() {
        let topo = ExpectedTopology::parse(TOPOLOGY);
        let leaf = topo.expectations_for("leaf01");
        assert_eq!(leaf.len(), 2);
        assert_eq!(leaf[0], ("swp51".to_string(), Endpoint::new("spine01", "swp1")));
        assert_eq!(leaf[1], ("swp52".to_string(), Endpoint::new("spine02", "swp1")));

        let spine = topo.expectations_for("spine02");
        assert_eq!(spine, vec![("swp1".to_string(), Endpoint::new("leaf01", "swp52"))]);
    }

    #[test]
    fn test_load_missing_file() {
        let topo = ExpectedTopology::load(Path::new("/nonexistent/topology.dot"));
        assert!(topo.is_empty());
    }
}
