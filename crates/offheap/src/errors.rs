//! Application errors and their exit codes.

use offheap_core::{exit_codes, CacheError};

/// Failures that end a run with a specific exit code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Flags or environment did not describe a valid workload.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The probe value did not fit, even after compaction.
    #[error("probe value of {requested} bytes did not fit")]
    Capacity {
        /// Probe size in bytes.
        requested: usize,
        /// Underlying allocation failure.
        #[source]
        source: CacheError,
    },
    /// Values read back differently from how they were written.
    #[error("{0} value(s) did not read back as stored")]
    Mismatch(usize),
    /// Any other cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl AppError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_codes::ERROR_CONFIG,
            Self::Capacity { .. } | Self::Cache(CacheError::CapacityExceeded { .. }) => {
                exit_codes::ERROR_CAPACITY
            }
            Self::Mismatch(_) => exit_codes::ERROR_MISMATCH,
            Self::Cache(_) => exit_codes::ERROR_GENERIC,
        }
    }
}

/// Exit code for an error surfacing from [`crate::app::run`].
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<AppError>()
        .map_or(exit_codes::ERROR_GENERIC, AppError::exit_code)
}
