//! Error types shared by every driver

use thiserror::Error;

/// Result type alias
pub type ShelfResult<T> = Result<T, ShelfError>;

/// Error taxonomy surfaced by every driver
#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ShelfError {
    /// Wrap an I/O error raised while touching `path`.
    ///
    /// A missing path becomes [`ShelfError::NotFound`] so callers see the same
    /// variant whether the miss was detected up front or by the OS.
    pub fn io(err: std::io::Error, path: impl Into<String>) -> Self {
        if is_missing(&err) {
            ShelfError::NotFound(path.into())
        } else {
            ShelfError::Io(err)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ShelfError::NotFound(_))
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, ShelfError::NotSupported(_))
    }
}

/// True when `err` means the path does not resolve.
///
/// Walking through a regular file (`a.txt/x`) fails with `ENOTDIR` rather
/// than `ENOENT`; both mean nothing lives at that path.
pub fn is_missing(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::NotFound {
        return true;
    }
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ENOTDIR)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

impl From<serde_json::Error> for ShelfError {
    fn from(err: serde_json::Error) -> Self {
        ShelfError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = ShelfError::NotFound("docs/a.txt".into());
        assert_eq!(format!("{}", err), "Path not found: docs/a.txt");

        let err = ShelfError::NotSupported("can't link a folder: b".into());
        assert!(format!("{}", err).contains("can't link a folder"));
    }

    #[test]
    fn test_io_maps_missing_to_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ShelfError::io(io_err, "a/b");
        assert!(err.is_not_found());
        assert_eq!(format!("{}", err), "Path not found: a/b");
    }

    #[cfg(unix)]
    #[test]
    fn test_io_maps_not_a_directory_to_not_found() {
        let io_err = std::io::Error::from_raw_os_error(libc::ENOTDIR);
        assert!(is_missing(&io_err));
        let err = ShelfError::io(io_err, "a.txt/x");
        assert!(err.is_not_found());
        assert_eq!(format!("{}", err), "Path not found: a.txt/x");
    }

    #[test]
    fn test_io_keeps_cause() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = ShelfError::io(io_err, "secret");
        assert!(matches!(err, ShelfError::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: ShelfError = io_err.into();
        assert!(matches!(err, ShelfError::Io(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_predicates() {
        assert!(ShelfError::NotSupported("preview".into()).is_not_supported());
        assert!(!ShelfError::Conflict("x".into()).is_not_supported());
    }
}
