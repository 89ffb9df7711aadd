use cs_core::CsError;
use cs_engine::PoolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CsError),

    #[error("resource pool error in district '{district}': {source}")]
    Pool {
        district: String,
        source:   PoolError,
    },
}

pub type SimResult<T> = Result<T, SimError>;
