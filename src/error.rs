//! Error type shared by the task store and the persistence layer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required field was empty.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("task #{id} not found")]
    NotFound { id: u32 },

    /// The data file is not valid JSON, or a record carries an unknown label.
    #[error("cannot decode task data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Label text that matches no variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}
