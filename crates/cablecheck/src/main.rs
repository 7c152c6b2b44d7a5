//! cablecheck entry point.
//!
//! Runs one reconciliation over the configured fabric snapshot and writes the
//! topology graph, the per-port report and the optional JSON summary.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fabric_cablecheck::{run, CableCheckConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "cablecheck", version)]
#[command(about = "Validate fabric cabling against LLDP neighbor dumps", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory holding the <device>_lldp_result.ini dumps
    #[arg(long)]
    lldp_dir: Option<PathBuf>,

    /// Graph artifact destination
    #[arg(long)]
    graph_output: Option<PathBuf>,

    /// Per-port report destination
    #[arg(long)]
    report_output: Option<PathBuf>,

    /// JSON summary destination
    #[arg(long)]
    summary_output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the effective configuration to --config and exit
    #[arg(long)]
    write_default_config: bool,
}

impl Args {
    fn apply(self, config: &mut CableCheckConfig) {
        if let Some(dir) = self.lldp_dir {
            config.paths.lldp_dir = dir;
        }
        if let Some(path) = self.graph_output {
            config.paths.graph_output = path;
        }
        if let Some(path) = self.report_output {
            config.paths.report_output = path;
        }
        if let Some(path) = self.summary_output {
            config.paths.summary_output = Some(path);
        }
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("cablecheck: failed to set tracing subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("--- Starting cablecheck ---");

    let mut config = match CableCheckConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::from(e.exit_code());
        }
    };
    let config_path = args.config.clone();
    let write_config = args.write_default_config;
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return ExitCode::from(e.exit_code());
    }

    if write_config {
        return match config.save(&config_path) {
            Ok(()) => {
                info!(path = %config_path.display(), "Wrote configuration");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, path = %config_path.display(), "Failed to write configuration");
                ExitCode::from(e.exit_code())
            }
        };
    }

    match run(&config).await {
        Ok(outcome) => {
            if outcome.write_failures > 0 {
                warn!(
                    failures = outcome.write_failures,
                    "Some artifacts could not be written"
                );
            }
            info!(
                devices = outcome.analysis.reports.len(),
                nodes = outcome.analysis.stats.nodes,
                links = outcome.analysis.stats.links,
                artifacts = outcome.artifacts_written,
                "--- cablecheck finished ---"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "cablecheck aborted, no artifacts written");
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_survive_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cablecheck.toml");
        let args = Args::try_parse_from([
            "cablecheck",
            "--config",
            path.to_str().unwrap(),
            "--lldp-dir",
            "/srv/lldp",
            "--summary-output",
            "/srv/out/summary.json",
            "--write-default-config",
        ])
        .unwrap();
        assert!(args.write_default_config);

        let mut config = CableCheckConfig::default();
        args.apply(&mut config);
        config.save(&path).unwrap();

        let loaded = CableCheckConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.paths.lldp_dir, PathBuf::from("/srv/lldp"));
        assert_eq!(
            loaded.paths.summary_output,
            Some(PathBuf::from("/srv/out/summary.json"))
        );
    }
}
