//! Error handling for the Sprout application.
//! Defines the error taxonomy and result type used throughout the application.

use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for Sprout operations.
///
/// Variants fall into three groups: validation errors (recoverable, re-prompt),
/// filesystem errors (fatal, carry the offending path) and process errors
/// raised by the install/start steps.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid project name or unknown template identifier
    #[error("Validation error: {0}.")]
    ValidationError(String),

    /// The project destination directory is already present
    #[error("Output directory '{output_dir}' already exists.")]
    OutputDirectoryExistsError { output_dir: String },

    /// Template contains a symlink, socket, FIFO or device entry
    #[error("Unsupported template entry (not a regular file or directory): '{path}'.")]
    UnsupportedEntryError { path: String },

    /// Filesystem operation failed on a known path
    #[error("Filesystem error at '{}': {source}.", .path.display())]
    PathIoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A destination path would land outside the project root
    #[error("Refusing to write outside the project root: '{}'.", .path.display())]
    PathEscapeError { path: PathBuf },

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// The dependency-install command failed; the pipeline halts
    #[error("Install command '{command}' failed ({code}):\n{output}")]
    InstallError { command: String, code: String, output: String },

    /// The dev-server start command failed; install results are retained
    #[error("Start command '{command}' failed ({reason}):\n{output}")]
    StartError { command: String, reason: String, output: String },

    /// A command could not be spawned at all
    #[error("Failed to spawn '{command}': {source}.")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Terminal interaction failed
    #[error("Prompt error: {0}.")]
    PromptError(String),

    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Exclude pattern error: {0}.")]
    GlobError(#[from] globset::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),
}

impl Error {
    /// Wraps an `io::Error` together with the path it occurred on.
    pub fn at_path<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::PathIoError { path, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::ValidationError(_))
    }

    pub fn is_filesystem(&self) -> bool {
        matches!(
            self,
            Error::OutputDirectoryExistsError { .. }
                | Error::UnsupportedEntryError { .. }
                | Error::PathIoError { .. }
                | Error::PathEscapeError { .. }
                | Error::IoError(_)
        )
    }

    pub fn is_process(&self) -> bool {
        matches!(
            self,
            Error::InstallError { .. } | Error::StartError { .. } | Error::SpawnError { .. }
        )
    }
}

/// Convenience type alias for Results with Sprout's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
