//! Configuration file support for cablecheck
//!
//! Loads and validates the tool configuration from TOML.
//! Default location: `cablecheck.toml` in the working directory.
//!
//! ```toml
//! [paths]
//! lldp_dir = "lldp-results"
//! graph_output = "/var/www/html/topology/topology.js"
//!
//! [inventory]
//! exclude_patterns = ["OOB-MGMT"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::GraphFormat;
use crate::error::{CableCheckError, Result};
use crate::lldp::DUMP_FILE_SUFFIX;
use crate::types::{DEFAULT_PLACEHOLDER, MANAGEMENT_INTERFACE};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "cablecheck.toml";

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the per-device LLDP dumps
    #[serde(default = "default_lldp_dir")]
    pub lldp_dir: PathBuf,

    /// Asset inventory table
    #[serde(default = "default_assets_file")]
    pub assets_file: PathBuf,

    /// Host list
    #[serde(default = "default_hosts_file")]
    pub hosts_file: PathBuf,

    /// Expected topology edge list
    #[serde(default = "default_topology_file")]
    pub topology_file: PathBuf,

    /// Device category table (YAML)
    #[serde(default = "default_category_file")]
    pub category_file: PathBuf,

    /// Graph artifact destination
    #[serde(default = "default_graph_output")]
    pub graph_output: PathBuf,

    /// Per-port report destination
    #[serde(default = "default_report_output")]
    pub report_output: PathBuf,

    /// JSON summary destination; no summary is written when unset
    #[serde(default)]
    pub summary_output: Option<PathBuf>,
}

/// LLDP dump interpretation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// File name suffix identifying dumps
    #[serde(default = "default_dump_suffix")]
    pub dump_suffix: String,

    /// Interfaces never treated as fabric links
    #[serde(default = "default_management_interfaces")]
    pub management_interfaces: Vec<String>,

    /// DNS suffixes stripped from non-Cumulus system names
    #[serde(default = "default_domain_suffixes")]
    pub sysname_domain_suffixes: Vec<String>,
}

/// Inventory handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Devices whose name contains one of these substrings are left out of
    /// the graph
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Enrichment value for devices without an asset record
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

/// Graph artifact options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub graph_format: GraphFormat,

    /// Variable name used by the `js` format
    #[serde(default = "default_graph_variable")]
    pub graph_variable: String,
}

/// Anomaly thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Unexpected ports on one device before a warning is raised; 0 disables
    #[serde(default = "default_unexpected_warning_count")]
    pub unexpected_warning_count: usize,
}

/// Complete cablecheck configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableCheckConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

// Default functions
fn default_lldp_dir() -> PathBuf {
    PathBuf::from("lldp-results")
}

fn default_assets_file() -> PathBuf {
    PathBuf::from("assets.ini")
}

fn default_hosts_file() -> PathBuf {
    PathBuf::from("hosts.ini")
}

fn default_topology_file() -> PathBuf {
    PathBuf::from("topology.dot")
}

fn default_category_file() -> PathBuf {
    PathBuf::from("topology_config.yaml")
}

fn default_graph_output() -> PathBuf {
    PathBuf::from("topology.js")
}

fn default_report_output() -> PathBuf {
    PathBuf::from("lldp-results/lldp_results.ini")
}

fn default_dump_suffix() -> String {
    DUMP_FILE_SUFFIX.to_string()
}

fn default_management_interfaces() -> Vec<String> {
    vec![MANAGEMENT_INTERFACE.to_string()]
}

fn default_domain_suffixes() -> Vec<String> {
    vec![".cm.cluster".to_string()]
}

fn default_exclude_patterns() -> Vec<String> {
    vec!["OOB-MGMT".to_string()]
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_graph_variable() -> String {
    "topologyData".to_string()
}

fn default_unexpected_warning_count() -> usize {
    3
}

// Default implementations
impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            lldp_dir: default_lldp_dir(),
            assets_file: default_assets_file(),
            hosts_file: default_hosts_file(),
            topology_file: default_topology_file(),
            category_file: default_category_file(),
            graph_output: default_graph_output(),
            report_output: default_report_output(),
            summary_output: None,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            dump_suffix: default_dump_suffix(),
            management_interfaces: default_management_interfaces(),
            sysname_domain_suffixes: default_domain_suffixes(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: default_exclude_patterns(),
            placeholder: default_placeholder(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            graph_format: GraphFormat::default(),
            graph_variable: default_graph_variable(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            unexpected_warning_count: default_unexpected_warning_count(),
        }
    }
}

impl CableCheckConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CableCheckError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(CableCheckError::Io(e)),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            CableCheckError::Config(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.discovery.dump_suffix.is_empty() {
            return Err(CableCheckError::Config(
                "dump_suffix must not be empty".to_string(),
            ));
        }

        if self.output.graph_format == GraphFormat::Js
            && !is_js_identifier(&self.output.graph_variable)
        {
            return Err(CableCheckError::Config(format!(
                "graph_variable '{}' is not a valid identifier",
                self.output.graph_variable
            )));
        }

        Ok(())
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
