//! Output artifact writing
//!
//! Write failures are reported to the caller as [`CableCheckError::WriteFailure`]
//! and are logged, never fatal for the run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::error::{CableCheckError, Result};
use crate::reconcile::TopologyGraph;

/// Serialization of the graph artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// Plain pretty-printed JSON.
    Json,
    /// JSON wrapped in a JavaScript variable declaration.
    #[default]
    Js,
}

/// Renders the graph in the requested format.
pub fn render_graph(
    graph: &TopologyGraph,
    format: GraphFormat,
    variable: &str,
) -> serde_json::Result<String> {
    let json = serde_json::to_string_pretty(graph)?;
    Ok(match format {
        GraphFormat::Json => json,
        GraphFormat::Js => format!("var {variable} = {json};\n"),
    })
}

/// Writes one artifact, creating the parent directory if needed.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CableCheckError::write_failure(path, e))?;
    }
    fs::write(path, contents).map_err(|e| CableCheckError::write_failure(path, e))?;
    info!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
    Ok(())
}

/// Writes one artifact and logs a failure instead of returning it.
///
/// Returns true when the artifact was written.
pub fn write_logged(path: &Path, contents: &str) -> bool {
    match write_artifact(path, contents) {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Failed to write artifact");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{GraphLink, GraphNode};
    use crate::types::DiscoveryState;
    use tempfile::TempDir;

    fn graph() -> TopologyGraph {
        let node = |id: usize, name: &str| GraphNode {
            icon: "switch".to_string(),
            id,
            layer: 4,
            name: name.to_string(),
            primary_ip: "N/A".to_string(),
            mac: "N/A".to_string(),
            model: "N/A".to_string(),
            serial_number: "N/A".to_string(),
            version: "N/A".to_string(),
        };
        TopologyGraph {
            nodes: vec![node(0, "leaf01"), node(1, "spine01")],
            links: vec![GraphLink {
                id: 0,
                source: 0,
                target: 1,
                src_device: "leaf01".to_string(),
                src_port: "swp51".to_string(),
                tgt_device: "spine01".to_string(),
                tgt_port: "swp1".to_string(),
                state: DiscoveryState::Confirmed,
            }],
        }
    }

    #[test]
    fn test_render_json_keys() {
        let text = render_graph(&graph(), GraphFormat::Json, "topologyData").unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        let node = &value["nodes"][0];
        for key in [
            "icon",
            "id",
            "layerSortPreference",
            "name",
            "primaryIP",
            "mac",
            "model",
            "serial_number",
            "version",
        ] {
            assert!(node.get(key).is_some(), "node key {key}");
        }

        let link = &value["links"][0];
        assert_eq!(link["srcIfName"], "swp51");
        assert_eq!(link["tgtDevice"], "spine01");
        assert_eq!(link["discoveryState"], "confirmed");
    }

    #[test]
    fn test_render_js_wrapper() {
        let text = render_graph(&graph(), GraphFormat::Js, "topologyData").unwrap();
        assert!(text.starts_with("var topologyData = {"));
        assert!(text.trim_end().ends_with("};"));
    }

    #[test]
    fn test_write_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/topology.js");
        write_artifact(&path, "x").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn test_write_failure_is_logged() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be overwritten with a file.
        assert!(!write_logged(dir.path(), "x"));
        let err = write_artifact(dir.path(), "x").unwrap_err();
        assert!(matches!(err, CableCheckError::WriteFailure { .. }));
    }
}
