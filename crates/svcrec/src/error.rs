//! Error types for recovery reconciliation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while querying or mutating service recovery state.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The service-control tool could not be started at all.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but reported failure. `output` carries the combined
    /// stdout and stderr for diagnosis.
    #[error("{command} exited with status {status}: {output}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },

    /// A desired-state document could not be read.
    #[error("failed to read desired state from {}: {source}", path.display())]
    DesiredRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A desired-state document could not be parsed.
    #[error("failed to parse desired state from {}: {source}", path.display())]
    DesiredParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A desired-state document could not be rendered back to TOML.
    #[error("failed to render desired state: {0}")]
    Render(#[from] toml::ser::Error),
}
