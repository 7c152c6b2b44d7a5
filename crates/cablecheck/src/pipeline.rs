//! Batch run over one fabric snapshot
//!
//! Per-device parsing and per-device classification run as one task per
//! device. Results are awaited in device order, so the merge that feeds the
//! reconciler is deterministic. Artifacts are written only once every step
//! has completed.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::artifact::{render_graph, write_logged};
use crate::category::{CategoryConfig, CategoryTable};
use crate::classify::classify_device;
use crate::config::CableCheckConfig;
use crate::error::{CableCheckError, Result};
use crate::expected::ExpectedTopology;
use crate::inventory::Inventory;
use crate::lldp::{device_from_dump_file, LldpDump, LldpParser};
use crate::normalize::KnownDevices;
use crate::reconcile::{ReconcileInput, ReconcileStats, Reconciler, TopologyGraph};
use crate::report::{render_report, DeviceReport, SummaryDocument};
use crate::types::UNKNOWN_NEIGHBOR;

/// Dump file found in the discovery directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub device: String,
    pub path: PathBuf,
}

/// Lists the dump files of `dir`, sorted by device name.
///
/// This is the only fatal input: an absent or unreadable directory fails the
/// run with [`CableCheckError::DumpDirectory`].
pub fn list_dump_files(dir: &Path, suffix: &str) -> Result<Vec<DumpFile>> {
    let entries = fs::read_dir(dir).map_err(|e| CableCheckError::dump_directory(dir, e))?;

    let mut files: Vec<DumpFile> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let device = device_from_dump_file(&name, suffix)?.to_string();
            Some(DumpFile {
                device,
                path: entry.path(),
            })
        })
        .collect();

    files.sort_by(|a, b| a.device.cmp(&b.device));
    Ok(files)
}

/// Parses every dump concurrently, one task per device.
///
/// Unreadable dump files are logged and contribute nothing.
pub async fn parse_dumps(files: Vec<DumpFile>, parser: &LldpParser) -> Vec<LldpDump> {
    let mut handles = Vec::with_capacity(files.len());

    for file in files {
        let parser = parser.clone();
        handles.push(tokio::spawn(async move {
            match tokio::fs::read(&file.path).await {
                Ok(bytes) => Some(parser.parse(&file.device, &String::from_utf8_lossy(&bytes))),
                Err(e) => {
                    let err = CableCheckError::missing_input(&file.path, e);
                    warn!(device = %file.device, error = %err, "Skipping unreadable LLDP dump");
                    None
                }
            }
        }));
    }

    let mut dumps = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Some(dump)) => {
                debug!(
                    device = %dump.device,
                    adjacencies = dump.adjacencies.len(),
                    skipped = dump.skipped_sections,
                    "Parsed LLDP dump"
                );
                dumps.push(dump);
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "LLDP parse task failed"),
        }
    }
    dumps
}

/// Names the interface normalizer may strip: inventory devices, dump
/// devices, reported neighbors and expected-topology devices.
pub fn known_devices(
    inventory: &Inventory,
    dumps: &[LldpDump],
    expected: &ExpectedTopology,
) -> KnownDevices {
    let mut known: KnownDevices = inventory.names().collect();
    for dump in dumps {
        known.insert(dump.device.as_str());
        known.extend(
            dump.adjacencies
                .iter()
                .filter(|a| a.neighbor != UNKNOWN_NEIGHBOR)
                .map(|a| a.neighbor.as_str()),
        );
    }
    known.extend(expected.device_names());
    known
}

/// Everything needed to analyze one fabric snapshot.
#[derive(Debug, Clone, Default)]
pub struct FabricInputs {
    pub inventory: Inventory,
    pub dumps: Vec<LldpDump>,
    pub expected: ExpectedTopology,
    pub categories: CategoryConfig,
}

/// Result of analyzing one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub graph: TopologyGraph,
    pub stats: ReconcileStats,
    /// One report per dumped device, in device order.
    pub reports: Vec<DeviceReport>,
}

/// Classifies every dumped device concurrently, then reconciles the graph.
#[instrument(skip_all, fields(devices = inputs.dumps.len()))]
pub async fn analyze(inputs: FabricInputs, config: &CableCheckConfig) -> Analysis {
    let FabricInputs {
        inventory,
        mut dumps,
        expected,
        categories,
    } = inputs;
    dumps.sort_by(|a, b| a.device.cmp(&b.device));

    let known = Arc::new(known_devices(&inventory, &dumps, &expected));
    let management = Arc::new(config.discovery.management_interfaces.clone());
    let dumps = Arc::new(dumps);

    let mut handles = Vec::with_capacity(dumps.len());
    for idx in 0..dumps.len() {
        let expectations = expected.expectations_for(&dumps[idx].device);
        let dumps = Arc::clone(&dumps);
        let known = Arc::clone(&known);
        let management = Arc::clone(&management);
        handles.push(tokio::spawn(async move {
            let dump = &dumps[idx];
            let ports = classify_device(
                &dump.device,
                &dump.adjacencies,
                &expectations,
                &known,
                &management,
            );
            DeviceReport::new(dump.device.as_str(), ports)
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => error!(error = %e, "Classification task failed"),
        }
    }

    let reconciler = Reconciler::new(CategoryTable::new(&categories))
        .with_management_interfaces(config.discovery.management_interfaces.clone())
        .with_exclude_patterns(config.inventory.exclude_patterns.clone())
        .with_placeholder(&config.inventory.placeholder);
    let reconciliation = reconciler.reconcile(ReconcileInput {
        inventory: &inventory,
        dumps: &dumps,
        expected: &expected,
        known: &known,
    });

    Analysis {
        graph: reconciliation.graph,
        stats: reconciliation.stats,
        reports,
    }
}

/// Outcome of a complete run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub analysis: Analysis,
    pub summary: SummaryDocument,
    pub artifacts_written: usize,
    pub write_failures: usize,
}

/// Loads every input, analyzes the fabric and writes the artifacts.
///
/// Returns an error only when the dump directory is unavailable, in which
/// case nothing is written. Write failures are logged and counted.
#[instrument(skip_all, fields(lldp_dir = %config.paths.lldp_dir.display()))]
pub async fn run(config: &CableCheckConfig) -> Result<RunOutcome> {
    let files = list_dump_files(&config.paths.lldp_dir, &config.discovery.dump_suffix)?;
    info!(dumps = files.len(), "Found LLDP dumps");

    let paths = &config.paths;
    let inventory = Inventory::load(
        &paths.assets_file,
        &paths.hosts_file,
        &config.inventory.placeholder,
    );
    let expected = ExpectedTopology::load(&paths.topology_file);
    let categories = CategoryConfig::load_or_default(&paths.category_file);

    let parser = LldpParser::new(config.discovery.sysname_domain_suffixes.clone());
    let dumps = parse_dumps(files, &parser).await;

    let analysis = analyze(
        FabricInputs {
            inventory,
            dumps,
            expected,
            categories,
        },
        config,
    )
    .await;

    let now = Local::now();
    let summary = SummaryDocument::new(
        &analysis.reports,
        analysis.stats.clone(),
        config.analysis.unexpected_warning_count,
        now,
    );

    let mut outputs: Vec<(&Path, String)> = Vec::with_capacity(3);
    let mut write_failures = 0;

    match render_graph(
        &analysis.graph,
        config.output.graph_format,
        &config.output.graph_variable,
    ) {
        Ok(text) => outputs.push((paths.graph_output.as_path(), text)),
        Err(e) => {
            error!(error = %e, "Failed to serialize topology graph");
            write_failures += 1;
        }
    }
    outputs.push((
        paths.report_output.as_path(),
        render_report(&analysis.reports, now),
    ));
    if let Some(summary_path) = &paths.summary_output {
        match summary.to_json() {
            Ok(text) => outputs.push((summary_path.as_path(), text)),
            Err(e) => {
                error!(error = %e, "Failed to serialize summary");
                write_failures += 1;
            }
        }
    }

    let mut artifacts_written = 0;
    for (path, text) in &outputs {
        if write_logged(path, text) {
            artifacts_written += 1;
        } else {
            write_failures += 1;
        }
    }

    info!(
        health = %summary.summary.health,
        ratio = summary.summary.health_ratio,
        anomalies = summary.anomalies.len(),
        "Cabling check complete"
    );

    Ok(RunOutcome {
        analysis,
        summary,
        artifacts_written,
        write_failures,
    })
}
