use thiserror::Error;

use chainledger_core::{BatchError, ExportError, FetchError, SchemaError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Source(#[from] FetchError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Schema(_) => 2,
            Self::Source(_) | Self::Batch(_) => 3,
            Self::Export(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
