//! `census-sim`: run every replication of a configuration file.
//!
//! ```console
//! $ census-sim --config configs/sample.json --output out --verbose
//! $ census-sim -c configs/sample.json --runs 0,2 --dry-run
//! ```
//!
//! Each replication writes `out/run_<id>/rep_<n>/{events,summary,daily_returns}.csv`.
//! Seeds not pinned in the configuration are derived from the run's
//! `base_seed`; a copy of the configuration with those seeds pinned is
//! written to `out/seeds.json`.

mod args;
mod error;
mod logging;
mod runner;


use std::process;

use clap::Parser;
use cs_core::load_runs;
use tracing::{error, info};

use crate::args::CliArgs;
use crate::error::{CliError, CliResult};

fn main() {
    let args = CliArgs::parse();

    if let Err(e) = args.logging().init() {
        eprintln!("Failed to initialise logging: {e}");
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> CliResult<()> {
    let runs = load_runs(&args.config)?;
    let jobs = runner::plan(&runs, &args.runs);
    info!(
        config = %args.config.display(),
        runs = runs.len(),
        replications = jobs.len(),
        "configuration loaded"
    );

    if args.dry_run {
        for job in &jobs {
            println!("run {} rep {} seed {}", job.run, job.rep, job.seed);
        }
        return Ok(());
    }

    runner::configure_threads(args.threads);
    let results = runner::run_all(&runs, &jobs, &args.output);

    let mut failed = 0;
    for (job, result) in &results {
        match result {
            Ok(summary) => info!(
                run = job.run,
                rep = job.rep,
                seed = job.seed,
                households = summary.households,
                responses = summary.responses,
                dropped = summary.dropped_records,
                "replication complete"
            ),
            Err(e) => {
                failed += 1;
                error!(run = job.run, rep = job.rep, seed = job.seed, error = %e, "replication failed");
            }
        }
    }

    runner::write_seeds(&args.output, &runs, &jobs)?;

    if failed > 0 {
        return Err(CliError::Failed { failed, total: jobs.len() });
    }
    Ok(())
}
