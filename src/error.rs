//! Error types for nucscan

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for nucscan operations
pub type Result<T> = std::result::Result<T, NucError>;

/// Failures surfaced by table loading, sequence loading and scanning.
///
/// Nothing in the crate retries; every error travels up to the caller.
#[derive(Debug, Error)]
pub enum NucError {
    /// Invalid alphabet, empty name or sequence, malformed input
    #[error("{0}")]
    Validation(String),

    /// A required file or directory could not be opened, created or written
    #[error("{}: {source}", .path.display())]
    Resource {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Anything else
    #[error("{0}")]
    Unexpected(String),
}

impl NucError {
    pub fn validation(msg: impl Into<String>) -> Self {
        NucError::Validation(msg.into())
    }

    pub fn resource(path: impl AsRef<Path>, source: io::Error) -> Self {
        NucError::Resource {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Short status text for the failure class.
    pub fn kind_label(&self) -> &'static str {
        match self {
            NucError::Validation(_) => "Invalid argument",
            NucError::Resource { .. } => "I/O failure",
            NucError::Unexpected(_) => "Unexpected failure",
        }
    }
}

/// Attach a path to an `io::Result`, turning it into a `NucError::Resource`.
pub trait ResourceContext<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ResourceContext<T> for io::Result<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| NucError::resource(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_reports_path() {
        let err = NucError::resource(
            "/nowhere/table.txt",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/nowhere/table.txt"));
        assert!(msg.contains("missing"));
        assert_eq!(err.kind_label(), "I/O failure");
    }

    #[test]
    fn at_path_maps_io_errors() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        match res.at_path("out/dir") {
            Err(NucError::Resource { path, .. }) => assert_eq!(path, PathBuf::from("out/dir")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
