use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool is full ({capacity} instances)")]
    Full { capacity: usize },

    #[error("released an instance while none were in use")]
    NotInUse,
}

pub type PoolResult<T> = Result<T, PoolError>;
