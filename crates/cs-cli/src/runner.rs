//! Replication planning, execution and seed bookkeeping.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use cs_core::{HOURS_PER_DAY, RunConfig};
use cs_output::{CsvWriter, OutputSink};
use cs_sim::{RunSummary, SimBuilder};
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// Name of the configuration copy written when any seed was derived.
pub const SEEDS_FILE: &str = "seeds.json";

/// One replication to simulate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub run:  u32,
    pub rep:  u32,
    pub seed: u64,
    /// The seed was derived rather than pinned in the configuration.
    pub derived: bool,
}

/// Every `(run, rep)` pair, runs in id order and replications numbered from 1.
/// A non-empty `only` restricts the runs.
pub fn plan(runs: &BTreeMap<u32, RunConfig>, only: &[u32]) -> Vec<Job> {
    runs.iter()
        .filter(|(id, _)| only.is_empty() || only.contains(id))
        .flat_map(|(&run, cfg)| {
            (1..=cfg.replications).map(move |rep| Job {
                run,
                rep,
                seed: cfg.seed_for(run, rep),
                derived: !cfg.replication_seeds.contains_key(&rep),
            })
        })
        .collect()
}

/// Whole days covered by a run, the last partial day included.
pub fn run_days(cfg: &RunConfig) -> u32 {
    (cfg.sim_hours() / HOURS_PER_DAY).ceil() as u32
}

/// Households of a run across every district and type.
pub fn run_households(cfg: &RunConfig) -> u32 {
    cfg.districts
        .values()
        .flat_map(|d| d.households.values())
        .map(|h| h.number)
        .sum()
}

/// Output directory of one replication.
pub fn job_dir(output: &Path, job: &Job) -> PathBuf {
    output.join(format!("run_{}", job.run)).join(format!("rep_{}", job.rep))
}

/// Build, run and write one replication.
pub fn run_job(cfg: &RunConfig, job: &Job, output: &Path) -> CliResult<RunSummary> {
    let dir = job_dir(output, job);
    let writer = CsvWriter::new(&dir)?;
    let mut sink = OutputSink::new(writer, job.run, job.rep, run_days(cfg), run_households(cfg));

    let mut sim = SimBuilder::new(cfg, job.run, job.rep).seed(job.seed).build()?;
    let summary = sim.run(&mut sink)?;
    debug!(run = job.run, rep = job.rep, dir = %dir.display(), "replication output written");
    Ok(summary)
}

/// Run every job.  Jobs are independent: a failure is reported in its slot
/// and the others carry on.
pub fn run_all(
    runs:   &BTreeMap<u32, RunConfig>,
    jobs:   &[Job],
    output: &Path,
) -> Vec<(Job, CliResult<RunSummary>)> {
    let execute = |job: &Job| -> (Job, CliResult<RunSummary>) {
        let result = match runs.get(&job.run) {
            Some(cfg) => run_job(cfg, job, output),
            None => Err(CliError::Config(cs_core::CsError::Run(format!("run {} is not configured", job.run)))),
        };
        (*job, result)
    };

    #[cfg(not(feature = "parallel"))]
    {
        jobs.iter().map(execute).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        jobs.par_iter().map(execute).collect()
    }
}

/// Size Rayon's global pool.  No-op without the `parallel` feature.
pub fn configure_threads(threads: usize) {
    #[cfg(feature = "parallel")]
    {
        if threads > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
                warn!(threads, error = %e, "could not size the worker pool; using the default");
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        if threads > 1 {
            warn!(threads, "built without the `parallel` feature; replications run sequentially");
        }
    }
}

/// The configuration with every derived seed pinned, so the same traces can
/// be reproduced later.  `None` when every seed was already pinned.
pub fn pinned_config(
    runs: &BTreeMap<u32, RunConfig>,
    jobs: &[Job],
) -> Option<BTreeMap<String, RunConfig>> {
    if !jobs.iter().any(|j| j.derived) {
        return None;
    }
    let mut pinned: BTreeMap<String, RunConfig> =
        runs.iter().map(|(id, cfg)| (id.to_string(), cfg.clone())).collect();
    for job in jobs.iter().filter(|j| j.derived) {
        if let Some(cfg) = pinned.get_mut(&job.run.to_string()) {
            cfg.replication_seeds.insert(job.rep, job.seed);
        }
    }
    Some(pinned)
}

/// Write [`pinned_config`] to `output/seeds.json`, if there is anything to
/// pin.  Returns the path written.
pub fn write_seeds(
    output: &Path,
    runs:   &BTreeMap<u32, RunConfig>,
    jobs:   &[Job],
) -> CliResult<Option<PathBuf>> {
    let Some(pinned) = pinned_config(runs, jobs) else {
        return Ok(None);
    };
    let path = output.join(SEEDS_FILE);
    std::fs::create_dir_all(output).map_err(|source| CliError::Seeds { path: path.clone(), source })?;
    let file = File::create(&path).map_err(|source| CliError::Seeds { path: path.clone(), source })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &pinned)?;
    info!(path = %path.display(), "derived seeds written");
    Ok(Some(path))
}
