//! On-disk fabric snapshots for end-to-end runs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fabric_cablecheck::{CableCheckConfig, GraphFormat};
use tempfile::TempDir;
use thiserror::Error;

use crate::fixtures::DumpBuilder;

/// Fixture error types
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Graph artifact is not a `var <name> = ...;` wrapper")]
    NotJsWrapped,
}

/// Result type for fixture operations
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Temporary directory laid out like a collector's working directory.
///
/// ```text
/// <tmp>/lldp-results/<device>_lldp_result.ini
/// <tmp>/assets.ini  hosts.ini  topology.dot  topology_config.yaml
/// <tmp>/out/topology.js  out/lldp_results.ini  out/summary.json
/// ```
pub struct FabricFixture {
    dir: TempDir,
    config: CableCheckConfig,
}

impl FabricFixture {
    /// Creates an empty snapshot with an existing dump directory.
    pub fn new() -> FixtureResult<Self> {
        let dir = TempDir::new()?;
        let root = dir.path();
        fs::create_dir(root.join("lldp-results"))?;

        let mut config = CableCheckConfig::default();
        config.paths.lldp_dir = root.join("lldp-results");
        config.paths.assets_file = root.join("assets.ini");
        config.paths.hosts_file = root.join("hosts.ini");
        config.paths.topology_file = root.join("topology.dot");
        config.paths.category_file = root.join("topology_config.yaml");
        config.paths.graph_output = root.join("out/topology.js");
        config.paths.report_output = root.join("out/lldp_results.ini");
        config.paths.summary_output = Some(root.join("out/summary.json"));

        Ok(Self { dir, config })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &CableCheckConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CableCheckConfig {
        &mut self.config
    }

    pub fn write_assets(&self, text: &str) -> FixtureResult<()> {
        Ok(fs::write(&self.config.paths.assets_file, text)?)
    }

    pub fn write_hosts(&self, text: &str) -> FixtureResult<()> {
        Ok(fs::write(&self.config.paths.hosts_file, text)?)
    }

    pub fn write_topology(&self, text: &str) -> FixtureResult<()> {
        Ok(fs::write(&self.config.paths.topology_file, text)?)
    }

    pub fn write_categories(&self, yaml: &str) -> FixtureResult<()> {
        Ok(fs::write(&self.config.paths.category_file, yaml)?)
    }

    /// Writes `<device>_lldp_result.ini` into the dump directory.
    pub fn write_dump(&self, device: &str, dump: &DumpBuilder) -> FixtureResult<PathBuf> {
        let path = self
            .config
            .paths
            .lldp_dir
            .join(format!("{device}{}", self.config.discovery.dump_suffix));
        fs::write(&path, dump.render())?;
        Ok(path)
    }

    /// Removes the dump directory.
    pub fn remove_dump_dir(&self) -> FixtureResult<()> {
        Ok(fs::remove_dir_all(&self.config.paths.lldp_dir)?)
    }

    /// Raw graph artifact text.
    pub fn read_graph_text(&self) -> FixtureResult<String> {
        Ok(fs::read_to_string(&self.config.paths.graph_output)?)
    }

    /// Graph artifact as JSON, unwrapping the `js` format if needed.
    pub fn read_graph(&self) -> FixtureResult<serde_json::Value> {
        let text = self.read_graph_text()?;
        let json = match self.config.output.graph_format {
            GraphFormat::Json => text.as_str(),
            GraphFormat::Js => text
                .split_once('=')
                .map(|(_, rest)| rest.trim().trim_end_matches(';'))
                .ok_or(FixtureError::NotJsWrapped)?,
        };
        Ok(serde_json::from_str(json)?)
    }

    pub fn read_report(&self) -> FixtureResult<String> {
        Ok(fs::read_to_string(&self.config.paths.report_output)?)
    }

    pub fn read_summary(&self) -> FixtureResult<serde_json::Value> {
        let path = self
            .config
            .paths
            .summary_output
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "summary disabled"))?;
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Returns true if any artifact exists.
    pub fn any_artifact_written(&self) -> bool {
        let paths = &self.config.paths;
        paths.graph_output.exists()
            || paths.report_output.exists()
            || paths.summary_output.as_ref().is_some_and(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_layout() {
        let fabric = FabricFixture::new().unwrap();
        assert!(fabric.config().paths.lldp_dir.is_dir());
        let path = fabric
            .write_dump("leaf01", &DumpBuilder::new().neighbor("swp1", "spine01", "swp1"))
            .unwrap();
        assert!(path.ends_with("leaf01_lldp_result.ini"));
        assert!(!fabric.any_artifact_written());
    }
}
