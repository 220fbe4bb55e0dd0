//! Error types shared by the library modules.
//!
//! Filesystem failures are classified by [`std::io::ErrorKind`] so that a missing
//! credentials file and a denied read surface as different variants.

use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, AwspsError>;

pub const UNCONFIGURED_HINT: &str =
    "Your system hasn't been configured to use awsps yet. Please run \"awsps configure\"";

#[derive(Debug, thiserror::Error)]
pub enum AwspsError {
    #[error("permission denied while trying to {action} {}. Please elevate privileges and try again", path.display())]
    PermissionDenied {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("credentials file not found: {}", path.display())]
    CredentialsNotFound { path: PathBuf },

    #[error("{0}")]
    Unconfigured(String),

    #[error("invalid values: {0}")]
    InvalidValues(String),

    #[error("persisting environment variables is not supported on {0}")]
    PersistenceUnsupported(&'static str),

    #[error("failed to persist {var}: {detail}")]
    PersistenceFailed { var: String, detail: String },

    #[error("failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AwspsError {
    /// Classify an I/O error raised while performing `action` on `path`.
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                action,
                path: path.to_path_buf(),
                source,
            },
            _ => Self::Io {
                action,
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub fn unconfigured() -> Self {
        Self::Unconfigured(UNCONFIGURED_HINT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_classification() {
        let path = Path::new("/tmp/credentials");

        let denied = AwspsError::io("read", path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, AwspsError::PermissionDenied { .. }));

        let other = AwspsError::io("read", path, io::Error::from(io::ErrorKind::InvalidData));
        assert!(matches!(other, AwspsError::Io { .. }));
    }

    #[test]
    fn test_unconfigured_message() {
        let err = AwspsError::unconfigured();
        assert!(err.to_string().contains("awsps configure"));
    }
}
