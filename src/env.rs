//! Persistent environment variables.
//!
//! The AWS CLI is pointed at the active-profile link through `AWS_SHARED_CREDENTIALS_FILE`
//! and `AWS_PROFILE`. Making those stick across shell sessions is platform specific, so it
//! sits behind [`EnvPersistence`]. Platforms without an implementation report
//! [`AwspsError::PersistenceUnsupported`] instead of silently doing nothing.

use log::debug;
use std::process::Command;

use crate::error::{AwspsError, Result};

pub const CREDENTIALS_FILE_VAR: &str = "AWS_SHARED_CREDENTIALS_FILE";
pub const PROFILE_VAR: &str = "AWS_PROFILE";
/// Profile label every materialized file is written under
pub const PROFILE_LABEL: &str = "default";

/// Capability to set or clear user-level environment variables
pub trait EnvPersistence {
    /// Human readable platform name
    fn platform(&self) -> &'static str;

    fn persist(&self, var: &str, value: &str) -> Result<()>;

    fn revert(&self, var: &str) -> Result<()>;
}

/// Windows: `setx` writes to `HKCU\Environment`, `reg delete` removes the value
#[derive(Debug, Default)]
pub struct Setx;

impl EnvPersistence for Setx {
    fn platform(&self) -> &'static str {
        "windows"
    }

    fn persist(&self, var: &str, value: &str) -> Result<()> {
        run(var, Command::new("setx").args([var, value]))
    }

    fn revert(&self, var: &str) -> Result<()> {
        run(
            var,
            Command::new("reg").args(["delete", r"HKCU\Environment", "/v", var, "/f"]),
        )
    }
}

/// Any platform without a persistence mechanism
#[derive(Debug)]
pub struct Unsupported {
    pub platform: &'static str,
}

impl EnvPersistence for Unsupported {
    fn platform(&self) -> &'static str {
        self.platform
    }

    fn persist(&self, _var: &str, _value: &str) -> Result<()> {
        Err(AwspsError::PersistenceUnsupported(self.platform))
    }

    fn revert(&self, _var: &str) -> Result<()> {
        Err(AwspsError::PersistenceUnsupported(self.platform))
    }
}

/// Pick the persistence mechanism for the platform we were built for
pub fn platform_persistence() -> Box<dyn EnvPersistence> {
    if cfg!(windows) {
        Box::new(Setx)
    } else {
        Box::new(Unsupported {
            platform: std::env::consts::OS,
        })
    }
}

/// Shell lines a user can add to their profile when persistence is unavailable
pub fn manual_exports(link_path: &std::path::Path) -> Vec<String> {
    vec![
        format!("export {}=\"{}\"", CREDENTIALS_FILE_VAR, link_path.display()),
        format!("export {}={}", PROFILE_VAR, PROFILE_LABEL),
    ]
}

fn run(var: &str, command: &mut Command) -> Result<()> {
    debug!("running {:?}", command);

    let output = command.output().map_err(|e| AwspsError::PersistenceFailed {
        var: var.to_string(),
        detail: e.to_string(),
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() || !stderr.trim().is_empty() {
        return Err(AwspsError::PersistenceFailed {
            var: var.to_string(),
            detail: if stderr.trim().is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            },
        });
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Records calls instead of touching the real environment
    #[derive(Debug, Default)]
    pub struct RecordingPersistence {
        pub persisted: RefCell<Vec<(String, String)>>,
        pub reverted: RefCell<Vec<String>>,
        pub fail: bool,
    }

    impl EnvPersistence for RecordingPersistence {
        fn platform(&self) -> &'static str {
            "test"
        }

        fn persist(&self, var: &str, value: &str) -> Result<()> {
            if self.fail {
                return Err(AwspsError::PersistenceFailed {
                    var: var.to_string(),
                    detail: "refused".to_string(),
                });
            }
            self.persisted
                .borrow_mut()
                .push((var.to_string(), value.to_string()));
            Ok(())
        }

        fn revert(&self, var: &str) -> Result<()> {
            if self.fail {
                return Err(AwspsError::PersistenceFailed {
                    var: var.to_string(),
                    detail: "refused".to_string(),
                });
            }
            self.reverted.borrow_mut().push(var.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_unsupported_is_explicit() {
        let persistence = Unsupported { platform: "plan9" };
        assert!(matches!(
            persistence.persist(PROFILE_VAR, PROFILE_LABEL),
            Err(AwspsError::PersistenceUnsupported("plan9"))
        ));
        assert!(matches!(
            persistence.revert(PROFILE_VAR),
            Err(AwspsError::PersistenceUnsupported(_))
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_platform_persistence_off_windows() {
        let persistence = platform_persistence();
        assert_eq!(persistence.platform(), std::env::consts::OS);
        assert!(persistence.persist(PROFILE_VAR, PROFILE_LABEL).is_err());
    }

    #[test]
    fn test_manual_exports() {
        let lines = manual_exports(Path::new("/home/someone/.aws/chosenProfile"));
        assert_eq!(
            lines[0],
            "export AWS_SHARED_CREDENTIALS_FILE=\"/home/someone/.aws/chosenProfile\""
        );
        assert_eq!(lines[1], "export AWS_PROFILE=default");
    }
}
