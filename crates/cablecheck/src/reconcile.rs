//! Topology reconciliation
//!
//! Builds the canonical fabric graph from the inventory, the parsed LLDP
//! dumps and the expected topology:
//!
//! 1. Seed one node per inventory device, categorized by name.
//! 2. Add one directed edge candidate per usable adjacency, creating
//!    placeholder nodes for devices seen only through LLDP.
//! 3. Mark each discovered edge `confirmed` or `failed` against the
//!    expected topology.
//! 4. Add a `missing` edge for every declared link never discovered.
//! 5. Keep only the first occurrence of each cable, in either direction.
//! 6. Drop unreferenced non-inventory nodes, sort by name and compact ids.
//!
//! Ids depend only on the inputs, so identical inputs always produce an
//! identical graph.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::category::CategoryTable;
use crate::expected::ExpectedTopology;
use crate::inventory::{AssetRecord, Inventory, InventoryDevice};
use crate::lldp::LldpDump;
use crate::normalize::KnownDevices;
use crate::types::{is_management_port, DiscoveryState, Endpoint, LinkKey, UNKNOWN_ICON};

/// Final graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub icon: String,
    pub id: usize,
    #[serde(rename = "layerSortPreference")]
    pub layer: u32,
    pub name: String,
    #[serde(rename = "primaryIP")]
    pub primary_ip: String,
    pub mac: String,
    pub model: String,
    pub serial_number: String,
    pub version: String,
}

impl GraphNode {
    fn new(id: usize, name: &str, layer: u32, icon: &str, asset: &AssetRecord) -> Self {
        Self {
            icon: icon.to_string(),
            id,
            layer,
            name: name.to_string(),
            primary_ip: asset.primary_ip.clone(),
            mac: asset.mac.clone(),
            model: asset.model.clone(),
            serial_number: asset.serial_number.clone(),
            version: asset.version.clone(),
        }
    }
}

/// Final graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub id: usize,
    pub source: usize,
    pub target: usize,
    #[serde(rename = "srcDevice")]
    pub src_device: String,
    #[serde(rename = "srcIfName")]
    pub src_port: String,
    #[serde(rename = "tgtDevice")]
    pub tgt_device: String,
    #[serde(rename = "tgtIfName")]
    pub tgt_port: String,
    #[serde(rename = "discoveryState")]
    pub state: DiscoveryState,
}

impl GraphLink {
    pub fn source_endpoint(&self) -> Endpoint {
        Endpoint::new(&self.src_device, &self.src_port)
    }

    pub fn target_endpoint(&self) -> Endpoint {
        Endpoint::new(&self.tgt_device, &self.tgt_port)
    }

    pub fn key(&self) -> LinkKey {
        LinkKey::new(self.source_endpoint(), self.target_endpoint())
    }
}

/// Canonical, deduplicated fabric graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologyGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl TopologyGraph {
    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Link for a cable, in either orientation.
    pub fn link(&self, a: &Endpoint, b: &Endpoint) -> Option<&GraphLink> {
        let key = LinkKey::new(a.clone(), b.clone());
        self.links.iter().find(|l| l.key() == key)
    }

    pub fn count_state(&self, state: DiscoveryState) -> usize {
        self.links.iter().filter(|l| l.state == state).count()
    }
}

/// Counters describing one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub nodes: usize,
    pub links: usize,
    pub confirmed: usize,
    pub failed: usize,
    pub missing: usize,
    /// Nodes created for devices outside the inventory.
    pub placeholder_nodes: usize,
    /// Adjacencies without a usable neighbor or on a management port.
    pub skipped_adjacencies: usize,
    /// Later occurrences of an already-seen cable.
    pub duplicate_links: usize,
    /// Undiscovered declared links with an endpoint outside the node set.
    pub dropped_expected: usize,
}

/// Graph plus the counters produced while building it.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub graph: TopologyGraph,
    pub stats: ReconcileStats,
}

/// Inputs of one reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub inventory: &'a Inventory,
    pub dumps: &'a [LldpDump],
    pub expected: &'a ExpectedTopology,
    pub known: &'a KnownDevices,
}

/// Device repository owned by one reconciliation.
///
/// Provisional ids are insertion indices; they are replaced during compaction.
#[derive(Debug, Default)]
pub struct DeviceIndex {
    nodes: Vec<GraphNode>,
    ids: HashMap<String, usize>,
    inventory: HashSet<String>,
}

impl DeviceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inventory device.
    pub fn insert_inventory(&mut self, device: &InventoryDevice, categories: &CategoryTable) {
        if self.ids.contains_key(&device.name) {
            return;
        }
        let category = categories.categorize(&device.name);
        let id = self.nodes.len();
        self.nodes.push(GraphNode::new(
            id,
            &device.name,
            category.layer,
            &category.icon,
            &device.asset,
        ));
        self.ids.insert(device.name.clone(), id);
        self.inventory.insert(device.name.clone());
    }

    /// Returns the id of `name`, adding a placeholder node if needed.
    pub fn ensure(&mut self, name: &str, layer: u32, placeholder: &AssetRecord) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes
            .push(GraphNode::new(id, name, layer, UNKNOWN_ICON, placeholder));
        self.ids.insert(name.to_string(), id);
        debug!(device = name, "Added placeholder node");
        id
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn is_inventory(&self, name: &str) -> bool {
        self.inventory.contains(name)
    }

    fn set_icon(&mut self, name: &str, icon: &str) {
        if let Some(&id) = self.ids.get(name) {
            self.nodes[id].icon = icon.to_string();
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Edge candidate before deduplication and compaction.
#[derive(Debug, Clone)]
struct Candidate {
    key: LinkKey,
    source: Endpoint,
    target: Endpoint,
    state: DiscoveryState,
}

/// Topology reconciler.
#[derive(Debug, Clone)]
pub struct Reconciler {
    categories: CategoryTable,
    management_interfaces: Vec<String>,
    exclude_patterns: Vec<String>,
    placeholder: AssetRecord,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(CategoryTable::default())
    }
}

impl Reconciler {
    pub fn new(categories: CategoryTable) -> Self {
        Self {
            categories,
            management_interfaces: vec![crate::types::MANAGEMENT_INTERFACE.to_string()],
            exclude_patterns: Vec::new(),
            placeholder: AssetRecord::default(),
        }
    }

    /// Interfaces that never carry fabric links.
    pub fn with_management_interfaces(mut self, interfaces: Vec<String>) -> Self {
        self.management_interfaces = interfaces;
        self
    }

    /// Inventory devices whose name contains one of these substrings are not
    /// seeded as nodes.
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Enrichment placeholder for nodes outside the inventory.
    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = AssetRecord::placeholder(placeholder);
        self
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|p| !p.is_empty() && name.contains(p.as_str()))
    }

    /// Builds the canonical graph.
    #[instrument(skip_all)]
    pub fn reconcile(&self, input: ReconcileInput<'_>) -> Reconciliation {
        let mut stats = ReconcileStats::default();
        let mut index = DeviceIndex::new();
        let default_layer = self.categories.default_layer();

        for device in input.inventory.devices() {
            if self.is_excluded(&device.name) {
                debug!(device = %device.name, "Excluded from graph");
                continue;
            }
            index.insert_inventory(device, &self.categories);
        }

        let mut dumps: Vec<&LldpDump> = input.dumps.iter().collect();
        dumps.sort_by(|a, b| a.device.cmp(&b.device));

        let mut reachable = BTreeSet::new();
        let mut discovered = HashSet::new();
        let mut candidates = Vec::new();

        for dump in dumps {
            reachable.insert(dump.device.as_str());
            index.ensure(&dump.device, default_layer, &self.placeholder);

            for adjacency in &dump.adjacencies {
                if adjacency.has_unknown_neighbor() {
                    stats.skipped_adjacencies += 1;
                    continue;
                }
                let neighbor_port = input.known.normalize(&adjacency.neighbor_port);
                if neighbor_port.is_empty()
                    || is_management_port(&adjacency.local_port, &self.management_interfaces)
                    || is_management_port(neighbor_port, &self.management_interfaces)
                {
                    stats.skipped_adjacencies += 1;
                    continue;
                }

                index.ensure(&adjacency.neighbor, default_layer, &self.placeholder);

                let source = adjacency.local_endpoint();
                let target = Endpoint::new(&adjacency.neighbor, neighbor_port);
                let key = LinkKey::new(source.clone(), target.clone());
                let state = if input.expected.contains(&key) {
                    DiscoveryState::Confirmed
                } else {
                    DiscoveryState::Failed
                };
                discovered.insert(key.clone());
                candidates.push(Candidate {
                    key,
                    source,
                    target,
                    state,
                });
            }
        }

        // Inventory switches without a dump and not plain hosts: role unknown.
        let unreachable: Vec<String> = input
            .inventory
            .devices()
            .filter(|d| !d.is_host_only() && !reachable.contains(d.name.as_str()))
            .map(|d| d.name.clone())
            .collect();
        for name in &unreachable {
            index.set_icon(name, UNKNOWN_ICON);
        }

        for link in input.expected.links() {
            let key = link.key();
            if discovered.contains(&key) {
                continue;
            }
            if !index.contains(&link.a.device) || !index.contains(&link.b.device) {
                debug!(link = %key, "Dropping declared link with unknown endpoint");
                stats.dropped_expected += 1;
                continue;
            }
            candidates.push(Candidate {
                key,
                source: link.a.clone(),
                target: link.b.clone(),
                state: DiscoveryState::Missing,
            });
        }

        if stats.dropped_expected > 0 {
            warn!(
                dropped = stats.dropped_expected,
                "Declared links reference devices outside the node set"
            );
        }

        let mut seen = HashSet::new();
        let mut surviving = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if seen.insert(candidate.key.clone()) {
                surviving.push(candidate);
            } else {
                stats.duplicate_links += 1;
            }
        }

        let (graph, placeholder_nodes) = compact(index, surviving);
        stats.placeholder_nodes = placeholder_nodes;

        stats.nodes = graph.nodes.len();
        stats.links = graph.links.len();
        stats.confirmed = graph.count_state(DiscoveryState::Confirmed);
        stats.failed = graph.count_state(DiscoveryState::Failed);
        stats.missing = graph.count_state(DiscoveryState::Missing);

        info!(
            nodes = stats.nodes,
            links = stats.links,
            confirmed = stats.confirmed,
            failed = stats.failed,
            missing = stats.missing,
            "Reconciled topology"
        );

        Reconciliation { graph, stats }
    }
}

/// Prunes unreferenced non-inventory nodes, sorts by name and reassigns
/// contiguous node and link ids. Also returns how many surviving nodes are
/// placeholders.
fn compact(index: DeviceIndex, links: Vec<Candidate>) -> (TopologyGraph, usize) {
    let referenced: HashSet<&str> = links
        .iter()
        .flat_map(|c| [c.source.device.as_str(), c.target.device.as_str()])
        .collect();

    let mut nodes: Vec<GraphNode> = index
        .nodes
        .iter()
        .filter(|n| index.is_inventory(&n.name) || referenced.contains(n.name.as_str()))
        .cloned()
        .collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    let placeholders = nodes.iter().filter(|n| !index.is_inventory(&n.name)).count();

    let mut ids = HashMap::with_capacity(nodes.len());
    for (new_id, node) in nodes.iter_mut().enumerate() {
        node.id = new_id;
        ids.insert(node.name.clone(), new_id);
    }

    let links = links
        .into_iter()
        .enumerate()
        .filter_map(|(id, c)| {
            let source = *ids.get(&c.source.device)?;
            let target = *ids.get(&c.target.device)?;
            Some(GraphLink {
                id,
                source,
                target,
                src_device: c.source.device,
                src_port: c.source.port,
                tgt_device: c.target.device,
                tgt_port: c.target.port,
                state: c.state,
            })
        })
        .collect();

    (TopologyGraph { nodes, links }, placeholders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{parse_assets, parse_hosts};
    use crate::types::Adjacency;
    use pretty_assertions::assert_eq;

    struct Fabric {
        inventory: Inventory,
        dumps: Vec<LldpDump>,
        expected: ExpectedTopology,
    }

    impl Fabric {
        fn new(assets: &str, hosts: &str, expected: &str) -> Self {
            Self {
                inventory: Inventory::from_parts(parse_assets(assets), parse_hosts(hosts), "N/A"),
                dumps: Vec::new(),
                expected: ExpectedTopology::parse(expected),
            }
        }

        fn dump(mut self, device: &str, adjacencies: &[(&str, &str, &str)]) -> Self {
            self.dumps.push(LldpDump {
                device: device.to_string(),
                adjacencies: adjacencies
                    .iter()
                    .map(|(local, nbr, port)| Adjacency::new(device, *local, *nbr, *port))
                    .collect(),
                skipped_sections: 0,
            });
            self
        }

        fn known(&self) -> KnownDevices {
            let mut known: KnownDevices = self.inventory.names().collect();
            known.extend(self.dumps.iter().map(|d| d.device.as_str()));
            known.extend(self.expected.device_names());
            known
        }

        fn reconcile(&self) -> Reconciliation {
            let known = self.known();
            Reconciler::default().reconcile(ReconcileInput {
                inventory: &self.inventory,
                dumps: &self.dumps,
                expected: &self.expected,
                known: &known,
            })
        }
    }

    const ASSETS: &str = "\
DEVICE IP MAC SERIAL MODEL VERSION
leaf01 10.0.0.11 aa:aa:aa:aa:aa:11 S11 SN3700 5.4
spine01 10.0.0.1 aa:aa:aa:aa:aa:01 S01 SN4600 5.4
";

    #[test]
    fn test_confirmed_edge() {
        let r = Fabric::new(ASSETS, "", r#""leaf01:swp51" -- "spine01:swp1""#)
            .dump("leaf01", &[("swp51", "spine01", "spine01-swp1")])
            .reconcile();

        assert_eq!(r.graph.links.len(), 1);
        let link = &r.graph.links[0];
        assert_eq!(link.state, DiscoveryState::Confirmed);
        assert_eq!(link.tgt_port, "swp1");
        assert_eq!(r.stats.confirmed, 1);
    }

    #[test]
    fn test_undocumented_edge_fails() {
        let r = Fabric::new(ASSETS, "", "")
            .dump("leaf01", &[("swp5", "spine01", "swp9")])
            .reconcile();
        assert_eq!(r.graph.links[0].state, DiscoveryState::Failed);
    }

    #[test]
    fn test_missing_edge_injected() {
        let r = Fabric::new(ASSETS, "", r#""leaf01:swp52" -- "spine01:swp2""#)
            .dump("leaf01", &[])
            .reconcile();
        assert_eq!(r.graph.links.len(), 1);
        assert_eq!(r.graph.links[0].state, DiscoveryState::Missing);
        assert_eq!(r.graph.links[0].src_device, "leaf01");
    }

    #[test]
    fn test_both_ends_reporting_dedup() {
        let r = Fabric::new(ASSETS, "", r#""leaf01:swp51" -- "spine01:swp1""#)
            .dump("leaf01", &[("swp51", "spine01", "swp1")])
            .dump("spine01", &[("swp1", "leaf01", "swp51")])
            .reconcile();
        assert_eq!(r.graph.links.len(), 1);
        assert_eq!(r.stats.duplicate_links, 1);
        // leaf01 sorts first, so its report is the one kept.
        assert_eq!(r.graph.links[0].src_device, "leaf01");
    }

    #[test]
    fn test_lldp_only_neighbor_gets_placeholder() {
        let r = Fabric::new(ASSETS, "", "")
            .dump("leaf01", &[("swp10", "server07", "enp1s0")])
            .reconcile();
        let node = r.graph.node("server07").unwrap();
        assert_eq!(node.icon, UNKNOWN_ICON);
        assert_eq!(node.primary_ip, "N/A");
        assert_eq!(r.stats.placeholder_nodes, 1);
    }

    #[test]
    fn test_management_and_unknown_neighbors_skipped() {
        let r = Fabric::new(ASSETS, "", "")
            .dump(
                "leaf01",
                &[
                    ("eth0", "oob-switch", "swp3"),
                    ("swp3", "oob-switch", "eth0"),
                    ("swp4", "Unknown", "eth1"),
                ],
            )
            .reconcile();
        assert!(r.graph.links.is_empty());
        assert_eq!(r.stats.skipped_adjacencies, 3);
        assert!(r.graph.node("oob-switch").is_none());
    }

    #[test]
    fn test_unknown_endpoint_dropped_and_counted() {
        let r = Fabric::new(ASSETS, "", r#""leaf01:swp1" -- "spine99:swp1""#)
            .dump("leaf01", &[])
            .reconcile();
        assert!(r.graph.links.is_empty());
        assert_eq!(r.stats.dropped_expected, 1);
    }

    #[test]
    fn test_ids_sorted_and_contiguous() {
        let r = Fabric::new(ASSETS, "HOST1\n", r#""spine01:swp2" -- "HOST1:eth1""#)
            .dump("spine01", &[("swp9", "zz-server", "eth2")])
            .dump("leaf01", &[])
            .reconcile();

        let names: Vec<_> = r.graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["HOST1", "leaf01", "spine01", "zz-server"]);
        for (i, node) in r.graph.nodes.iter().enumerate() {
            assert_eq!(node.id, i);
        }
        for (i, link) in r.graph.links.iter().enumerate() {
            assert_eq!(link.id, i);
            assert_eq!(r.graph.nodes[link.source].name, link.src_device);
            assert_eq!(r.graph.nodes[link.target].name, link.tgt_device);
        }
    }

    #[test]
    fn test_unreachable_switch_marked_unknown() {
        let r = Fabric::new(ASSETS, "HOST1\nspine01\n", "")
            .dump("leaf01", &[])
            .reconcile();
        assert_eq!(r.graph.node("spine01").unwrap().icon, UNKNOWN_ICON);
        assert_eq!(r.graph.node("leaf01").unwrap().icon, "switch");
        assert_eq!(r.graph.node("HOST1").unwrap().icon, "server");
    }

    #[test]
    fn test_unreferenced_dump_device_pruned() {
        let r = Fabric::new(ASSETS, "", "")
            .dump("orphan01", &[])
            .reconcile();
        assert!(r.graph.node("orphan01").is_none());
        assert!(r.graph.node("leaf01").is_some());
        assert_eq!(r.stats.placeholder_nodes, 0);
    }

    #[test]
    fn test_excluded_inventory_device() {
        let assets = format!("{ASSETS}OOB-MGMT-01 10.9.9.9 aa S99 X 1\n");
        let fabric = Fabric::new(&assets, "", "");
        let known = fabric.known();
        let r = Reconciler::default()
            .with_exclude_patterns(vec!["OOB-MGMT".to_string()])
            .reconcile(ReconcileInput {
                inventory: &fabric.inventory,
                dumps: &fabric.dumps,
                expected: &fabric.expected,
                known: &known,
            });
        assert!(r.graph.node("OOB-MGMT-01").is_none());
        assert_eq!(r.graph.nodes.len(), 2);
    }
}
