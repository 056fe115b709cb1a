use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WfError>;

/// Errors raised while reading or rewriting a wavefunction record file.
///
/// Every variant is fatal for the operation in progress. Once offsets inside the
/// file are in doubt nothing can be recovered, so none of these are retried.
#[derive(Debug, Error)]
pub enum WfError {
    /// A start keyword never appears in the file.
    #[error("Section '{keyword}' not found in '{file}'", file = .path.display())]
    SectionNotFound { path: PathBuf, keyword: String },

    /// A token is missing, unparsable, or out of place.
    #[error(
        "Malformed record in '{file}' at line {lineno}, token {token}: {reason}",
        file = .path.display(),
        lineno = .line + 1
    )]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        token: usize,
        reason: String,
    },

    /// A count field disagrees with the content it describes.
    #[error(
        "Count mismatch in section '{section}' of '{file}': expected {expected}, found {found}",
        file = .path.display()
    )]
    CountMismatch {
        path: PathBuf,
        section: &'static str,
        expected: usize,
        found: usize,
    },

    /// The token on disk no longer matches the text the cache was built from.
    #[error(
        "Stale write to '{file}' at line {lineno}, token {token}: expected '{expected}', found '{found}'",
        file = .path.display(),
        lineno = .line + 1
    )]
    StaleCacheWrite {
        path: PathBuf,
        line: usize,
        token: usize,
        expected: String,
        found: String,
    },

    #[error("I/O error for '{file}': {source}", file = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace '{file}' with rewritten copy: {source}", file = .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl WfError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WfError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(
        path: impl Into<PathBuf>,
        line: usize,
        token: usize,
        reason: impl Into<String>,
    ) -> Self {
        WfError::MalformedRecord {
            path: path.into(),
            line,
            token,
            reason: reason.into(),
        }
    }
}
