//! Shared helpers for reading procfs/sysfs sources.
//!
//! Readers return [`SourceError`] so callers can log the precise reason
//! before turning the failure into an absent sub-metric.

use std::fs;
use std::path::{Path, PathBuf};

/// Failure to obtain a value from a data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value {value:?} in {path}")]
    Parse { path: PathBuf, value: String },

    #[error("unexpected layout in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("{0}")]
    Unavailable(String),
}

impl SourceError {
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Reads a whole file into a string.
pub fn read_to_string(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a single-value pseudo-file and trims surrounding whitespace.
pub fn read_trimmed(path: &Path) -> Result<String, SourceError> {
    read_to_string(path).map(|content| content.trim().to_string())
}

/// Reads a pseudo-file holding one unsigned integer.
pub fn read_u64(path: &Path) -> Result<u64, SourceError> {
    let value = read_trimmed(path)?;
    value
        .parse::<u64>()
        .map_err(|_| SourceError::Parse {
            path: path.to_path_buf(),
            value,
        })
}

/// Reads a pseudo-file holding one number, integer or decimal.
pub fn read_f64(path: &Path) -> Result<f64, SourceError> {
    let value = read_trimmed(path)?;
    value
        .parse::<f64>()
        .map_err(|_| SourceError::Parse {
            path: path.to_path_buf(),
            value,
        })
}

/// Checks whether `name` starts with any of the given prefixes.
pub fn has_any_prefix<S: AsRef<str>>(name: &str, prefixes: &[S]) -> bool {
    prefixes.iter().any(|p| name.starts_with(p.as_ref()))
}
