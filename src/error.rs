//! Error types for wt
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation failure, unknown task or step)
//! - 3: Refused status transition
//! - 4: Operation failed (storage read/parse/write)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the wt CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const TRANSITION_REFUSED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for wt operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Step not found: {step} (task {task})")]
    StepNotFound { task: String, step: String },

    // Refused transitions (exit code 3)
    #[error("Cannot {action} a task in status '{from}'")]
    StateTransition { action: String, from: String },

    // Operation failures (exit code 4)
    #[error("Failed to read {path}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid task document {path}: {source}")]
    StorageParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::Validation(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::StepNotFound { .. } => exit_codes::USER_ERROR,

            // Refused transitions
            Error::StateTransition { .. } => exit_codes::TRANSITION_REFUSED,

            // Operation failures
            Error::StorageRead { .. }
            | Error::StorageWrite { .. }
            | Error::StorageParse { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for wt operations
pub type Result<T> = std::result::Result<T, Error>;
