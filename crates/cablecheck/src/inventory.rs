//! Device inventory loading
//!
//! Merges the asset table and the host list into one canonical device set.
//!
//! Asset table format (first line is a header and is skipped):
//! ```text
//! DEVICE-NAME   IP            MAC                SERIAL       MODEL       RELEASE
//! leaf01        10.0.0.11     44:38:39:00:00:11  MT2233X0001  SN3700      5.4.0
//! ```
//!
//! Host list format: one hostname per line; `#` comments and `[section]`
//! headers are ignored.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

use crate::input::read_optional;
use crate::types::DEFAULT_PLACEHOLDER;

/// Enrichment fields from the asset table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub primary_ip: String,
    pub mac: String,
    pub serial_number: String,
    pub model: String,
    pub version: String,
}

impl AssetRecord {
    /// Record with every field set to `placeholder`.
    pub fn placeholder(placeholder: &str) -> Self {
        Self {
            primary_ip: placeholder.to_string(),
            mac: placeholder.to_string(),
            serial_number: placeholder.to_string(),
            model: placeholder.to_string(),
            version: placeholder.to_string(),
        }
    }

    /// Parses one whitespace-delimited asset row.
    ///
    /// Returns the device name and its record, or `None` for short rows.
    pub fn from_line(line: &str) -> Option<(String, Self)> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            return None;
        }
        Some((
            parts[0].to_string(),
            Self {
                primary_ip: parts[1].to_string(),
                mac: parts[2].to_string(),
                serial_number: parts[3].to_string(),
                model: parts[4].to_string(),
                version: parts[5].to_string(),
            },
        ))
    }
}

/// Where an inventory device came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSource {
    /// Listed in the asset table (and possibly the host list).
    Asset,
    /// Only listed in the host list.
    HostOnly,
}

/// One inventory device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryDevice {
    pub name: String,
    pub asset: AssetRecord,
    pub source: DeviceSource,
}

impl InventoryDevice {
    pub fn is_host_only(&self) -> bool {
        self.source == DeviceSource::HostOnly
    }
}

/// Canonical device set, keyed and ordered by device name.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: BTreeMap<String, InventoryDevice>,
}

impl Inventory {
    /// Merges parsed assets and hosts.
    ///
    /// Hosts absent from the asset table are tagged [`DeviceSource::HostOnly`]
    /// and get placeholder enrichment.
    pub fn from_parts(
        assets: BTreeMap<String, AssetRecord>,
        hosts: BTreeSet<String>,
        placeholder: &str,
    ) -> Self {
        let mut devices: BTreeMap<String, InventoryDevice> = assets
            .into_iter()
            .map(|(name, asset)| {
                let device = InventoryDevice {
                    name: name.clone(),
                    asset,
                    source: DeviceSource::Asset,
                };
                (name, device)
            })
            .collect();

        for host in hosts {
            if devices.contains_key(&host) {
                continue;
            }
            debug!(host = %host, "Host-only inventory device");
            devices.insert(
                host.clone(),
                InventoryDevice {
                    name: host,
                    asset: AssetRecord::placeholder(placeholder),
                    source: DeviceSource::HostOnly,
                },
            );
        }

        Self { devices }
    }

    /// Loads both inventory files. Absent files contribute nothing.
    pub fn load(assets_path: &Path, hosts_path: &Path, placeholder: &str) -> Self {
        let assets = read_optional(assets_path)
            .map(|text| parse_assets(&text))
            .unwrap_or_default();
        let hosts = read_optional(hosts_path)
            .map(|text| parse_hosts(&text))
            .unwrap_or_default();

        let inventory = Self::from_parts(assets, hosts, placeholder);
        info!(
            devices = inventory.len(),
            host_only = inventory.host_only().count(),
            "Loaded inventory"
        );
        inventory
    }

    pub fn get(&self, name: &str) -> Option<&InventoryDevice> {
        self.devices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in ascending name order.
    pub fn devices(&self) -> impl Iterator<Item = &InventoryDevice> {
        self.devices.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn host_only(&self) -> impl Iterator<Item = &InventoryDevice> {
        self.devices.values().filter(|d| d.is_host_only())
    }
}

/// Parses the asset table. The first line is a header.
pub fn parse_assets(text: &str) -> BTreeMap<String, AssetRecord> {
    text.lines()
        .skip(1)
        .filter_map(AssetRecord::from_line)
        .collect()
}

/// Parses the host list.
pub fn parse_hosts(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('[') && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

impl Default for AssetRecord {
    fn default() -> Self {
        Self::placeholder(DEFAULT_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ASSETS: &str = "\
DEVICE-NAME IP MAC SERIAL MODEL RELEASE
leaf01 10.0.0.11 44:38:39:00:00:11 MT0001 SN3700 5.4.0
spine01 10.0.0.1 44:38:39:00:00:01 MT0002 SN4600 5.4.0
broken 10.0.0.9
";

    const HOSTS: &str = "\
# fabric hosts
[leaves]
leaf01
[servers]
HOST1
HOST2 ansible_host=10.1.0.2
";

    #[test]
    fn test_parse_assets_skips_header_and_short_rows() {
        let assets = parse_assets(ASSETS);
        assert_eq!(assets.len(), 2);
        assert_eq!(assets["leaf01"].primary_ip, "10.0.0.11");
        assert_eq!(assets["spine01"].model, "SN4600");
        assert!(!assets.contains_key("DEVICE-NAME"));
    }

    #[test]
    fn test_parse_hosts() {
        let hosts = parse_hosts(HOSTS);
        let expected: BTreeSet<String> = ["leaf01", "HOST1", "HOST2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(hosts, expected);
    }

    #[test]
    fn test_host_only_devices_get_placeholder() {
        let inv = Inventory::from_parts(parse_assets(ASSETS), parse_hosts(HOSTS), "N/A");
        assert_eq!(inv.len(), 4);

        let host = inv.get("HOST1").unwrap();
        assert!(host.is_host_only());
        assert_eq!(host.asset, AssetRecord::placeholder("N/A"));

        let leaf = inv.get("leaf01").unwrap();
        assert_eq!(leaf.source, DeviceSource::Asset);
        assert_eq!(leaf.asset.serial_number, "MT0001");
    }

    #[test]
    fn test_devices_sorted_by_name() {
        let inv = Inventory::from_parts(parse_assets(ASSETS), parse_hosts(HOSTS), "N/A");
        let names: Vec<_> = inv.names().collect();
        assert_eq!(names, vec!["HOST1", "HOST2", "leaf01", "spine01"]);
    }

    #[test]
    fn test_load_tolerates_missing_files() {
        let inv = Inventory::load(
            Path::new("/nonexistent/assets.ini"),
            Path::new("/nonexistent/hosts.ini"),
            "N/A",
        );
        assert!(inv.is_empty());
    }

    #[test]
    fn test_load_hosts_without_assets() {
        let mut hosts = NamedTempFile::new().unwrap();
        writeln!(hosts, "HOST1").unwrap();
        hosts.flush().unwrap();

        let inv = Inventory::load(Path::new("/nonexistent/assets.ini"), hosts.path(), "-");
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.get("HOST1").unwrap().asset.model, "-");
    }
}
