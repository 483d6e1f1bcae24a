//! Unified error types for the appstack workspace.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum AppStackError {
    /// Trust-on-first-use is disabled but the upload certificate set is incomplete.
    #[error(
        "allow_trust_on_first_use is false but {} not set; ca_cert_file, cert_file and key_file are all required",
        missing.join(", ")
    )]
    MissingCertConfig {
        /// Names of the parameters that were absent.
        missing: Vec<&'static str>,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// An external command exited unsuccessfully.
    #[error("{program} failed: {status}")]
    Command {
        /// Program that was invoked.
        program: String,
        /// Exit status or captured stderr.
        status: String,
    },

    /// A permission or ownership change was refused.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The parameters document is not valid YAML for the expected shape.
    #[error("invalid parameters document: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AppStackError>;
