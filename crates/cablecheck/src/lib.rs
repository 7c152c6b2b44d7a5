//! Fabric Cabling Check
//!
//! Reconciles LLDP neighbor dumps collected from every switch and host of a
//! fabric against a declared cabling plan. Produces a deduplicated topology
//! graph for visualization and a per-port report for operators and alerting.
//!
//! Inputs are an asset inventory, a host list, an expected topology edge list,
//! a device category table and one `<device>_lldp_result.ini` dump per device.

pub mod artifact;
pub mod category;
pub mod classify;
pub mod config;
pub mod error;
pub mod expected;
pub mod input;
pub mod inventory;
pub mod lldp;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod types;

pub use artifact::{render_graph, write_artifact, GraphFormat};
pub use category::{Category, CategoryConfig, CategoryTable, SpecialRule};
pub use classify::{classify_device, classify_port, PortClassification};
pub use config::{CableCheckConfig, DEFAULT_CONFIG_PATH};
pub use error::{CableCheckError, Result};
pub use expected::{ExpectedLink, ExpectedTopology};
pub use inventory::{AssetRecord, DeviceSource, Inventory, InventoryDevice};
pub use lldp::{parse_lldp_dump, LldpDialect, LldpDump, LldpParser};
pub use normalize::{normalize_interface_name, KnownDevices};
pub use pipeline::{analyze, run, Analysis, FabricInputs, RunOutcome};
pub use reconcile::{
    DeviceIndex, GraphLink, GraphNode, ReconcileInput, ReconcileStats, Reconciler, TopologyGraph,
};
pub use report::{Anomaly, DeviceReport, DeviceSummary, FabricSummary, SummaryDocument};
pub use types::*;
