//! Error types for covzerolib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a coverage baseline
#[derive(Error, Debug)]
pub enum CovzeroError {
    /// The current directory is needed to resolve a relative base path
    #[error("failed to read current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// Directory traversal failed under a watched directory
    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Content sniffing failed for an extensionless file
    #[error("failed to sniff content of '{path}': {source}")]
    Sniff {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create the output directory
    #[error("failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the baseline file
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON encoding of the coverage record failed
    #[error("failed to encode coverage data: {0}")]
    Encode(#[source] std::io::Error),
}
