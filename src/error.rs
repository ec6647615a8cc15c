//! Error taxonomy shared by the sync, normalization and fusion steps.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Upstream fetcher output directory does not exist (recovered, source skipped).
    #[error("source directory for {label} not found: {}", .path.display())]
    MissingSourceDirectory { label: String, path: PathBuf },

    /// Expected artifact absent from an existing source directory (recovered, file skipped).
    #[error("[{label}] missing artifact: {file}")]
    MissingArtifactFile { label: String, file: String },

    /// Artifact exists but is not the JSON we expect.
    #[error("malformed artifact {name}: {source}")]
    MalformedArtifact {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Store could not persist an artifact. Fatal to the triggering operation.
    #[error("cannot persist {name}: {source}")]
    PersistenceFailure {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid artifact name: {0:?}")]
    InvalidArtifactName(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Conditions the sync run recovers from by skipping the affected input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingSourceDirectory { .. } | Self::MissingArtifactFile { .. }
        )
    }
}
