//! Error types for the template engine
//!
//! Failures with a safe local fallback (a remote listing that times out, a
//! missing preferred branch) never reach this type's callers: the component
//! absorbs them and logs. Everything here is surfaced to the immediate caller.

use std::path::PathBuf;

/// Message shown when an update is attempted on a working tree with local changes
pub const DIRTY_TREE_MESSAGE: &str =
    "Destination repository is dirty; cannot continue. Please commit or stash your local changes and retry.";

/// Main error type for copier-core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The template schema document could not be parsed
    #[error("failed to parse template schema {origin}: {reason}")]
    SchemaParse { origin: String, reason: String },

    /// No schema file was found in a template checkout
    #[error("no copier.yaml, .copier.yaml, copier.yml or .copier.yml found in {}", dir.display())]
    SchemaNotFound { dir: PathBuf },

    /// A remote listing or query failed (timeout or non-zero exit)
    #[error("remote query `{command}` failed: {reason}")]
    RemoteQuery { command: String, reason: String },

    /// Update refused because the working tree has uncommitted changes
    #[error("{} ({})", DIRTY_TREE_MESSAGE, dir.display())]
    DirtyWorkingTree { dir: PathBuf },

    /// Update requested in a directory that was not generated from a template
    #[error("{} does not contain a .copier-answers.yml file; it may not be a Copier project", dir.display())]
    NotATemplateProject { dir: PathBuf },

    /// An external command exited with a non-zero status
    #[error("`{command}` failed with exit code {}: {stderr}", code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    CommandExecution {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external command ran past its time budget
    #[error("`{command}` timed out after {secs} seconds")]
    Timeout { command: String, secs: u64 },

    /// The operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// An external command could not be started
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid or unreadable settings
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the caller cancelling the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
