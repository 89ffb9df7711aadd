//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::logging::LoggingConfig;

/// Simulate census field operations for every run and replication of a
/// configuration file.
#[derive(Debug, Clone, Parser)]
#[command(name = "census-sim", version, about)]
pub struct CliArgs {
    /// Configuration file: a JSON object mapping run ids to run settings.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory receiving `run_<id>/rep_<n>/` output and the seed file.
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Only simulate these run ids (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub runs: Vec<u32>,

    /// Validate the configuration, list the replications and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Worker threads for the `parallel` build; 0 uses every core.
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Log per-replication progress.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log every simulation step (very noisy).
    #[arg(long, conflicts_with = "verbose")]
    pub debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,

    /// Disable coloured log output.
    #[arg(long)]
    pub no_ansi: bool,

    /// Explicit tracing filter, e.g. `cs_sim=debug,info`.  Overrides
    /// `--verbose`, `--debug` and `RUST_LOG`.
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl CliArgs {
    pub fn logging(&self) -> LoggingConfig {
        let level = if self.debug {
            Level::DEBUG
        } else if self.verbose {
            Level::INFO
        } else {
            Level::WARN
        };
        let mut cfg = LoggingConfig::new().with_level(level);
        if self.json_logs {
            cfg = cfg.with_json_format();
        }
        if self.no_ansi {
            cfg = cfg.without_ansi();
        }
        if let Some(filter) = &self.log_filter {
            cfg = cfg.with_env_filter(filter.clone());
        }
        cfg
    }
}
