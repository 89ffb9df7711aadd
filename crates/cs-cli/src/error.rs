use std::path::PathBuf;

use cs_core::CsError;
use cs_output::OutputError;
use cs_sim::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] CsError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to write seed file {}: {source}", path.display())]
    Seeds {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialise seeds: {0}")]
    Json(#[from] serde_json::Error),

    #[error("logging initialisation failed: {0}")]
    Logging(String),

    #[error("{failed} of {total} replications failed")]
    Failed { failed: usize, total: usize },
}

pub type CliResult<T> = Result<T, CliError>;
