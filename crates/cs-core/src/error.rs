//! Framework error type.
//!
//! Configuration defects are fatal: the run is aborted with a diagnostic
//! naming the offending district and household/resource type.  Nothing here
//! is ever silently defaulted.

use thiserror::Error;

/// The top-level error type for `cs-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CsError {
    #[error("configuration error in district '{district}', {subject}: {reason}")]
    Config {
        district: String,
        subject:  String,
        reason:   String,
    },

    #[error("configuration error: {0}")]
    Run(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CsError {
    /// Shorthand for a defect attributable to one district entry.
    pub fn config(
        district: impl Into<String>,
        subject:  impl Into<String>,
        reason:   impl Into<String>,
    ) -> Self {
        CsError::Config {
            district: district.into(),
            subject:  subject.into(),
            reason:   reason.into(),
        }
    }
}

/// Shorthand result type for all `cs-*` crates.
pub type CsResult<T> = Result<T, CsError>;
