//! First-run setup and teardown.
//!
//! `configure` is safe to run any number of times: existing profile files are kept and an
//! existing link is left alone. Environment variables are only persisted when the link is
//! created for the first time.

use log::{info, warn};

use crate::credentials::read_profiles;
use crate::env::{CREDENTIALS_FILE_VAR, EnvPersistence, PROFILE_LABEL, PROFILE_VAR};
use crate::error::{AwspsError, Result};
use crate::link::{LinkStatus, initialize_link, remove_link};
use crate::paths::Paths;
use crate::store::{StoreReport, materialize_profiles, remove_store};

/// What happened to the environment variables during `configure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceOutcome {
    Persisted,
    /// The link already existed, so nothing was attempted
    Skipped,
    Unsupported(&'static str),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ConfigureReport {
    pub store: StoreReport,
    pub link_created: bool,
    pub persistence: PersistenceOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct UninstallReport {
    pub link_removed: bool,
    pub store_removed: bool,
    /// Platform name when variables cannot be cleared here at all
    pub persistence_unsupported: Option<&'static str>,
    /// Best-effort revert failures
    pub warnings: Vec<String>,
}

/// Parse the credentials file and materialize any profile that has no file yet
pub fn sync_profiles(paths: &Paths) -> Result<StoreReport> {
    let profiles = read_profiles(&paths.credentials_file)?;
    materialize_profiles(paths, &profiles)
}

/// Populate the profile store, create the link and point the AWS CLI at it
pub fn configure(paths: &Paths, persistence: &dyn EnvPersistence) -> Result<ConfigureReport> {
    let store = sync_profiles(paths)?;
    info!(
        "materialized {} profile(s), {} already present",
        store.written.len(),
        store.skipped.len()
    );

    let link_created = initialize_link(paths)?;
    let persistence = if link_created {
        persist_variables(paths, persistence)
    } else {
        PersistenceOutcome::Skipped
    };

    Ok(ConfigureReport {
        store,
        link_created,
        persistence,
    })
}

fn persist_variables(paths: &Paths, persistence: &dyn EnvPersistence) -> PersistenceOutcome {
    let link = paths.link_path.to_string_lossy();
    let result = persistence
        .persist(CREDENTIALS_FILE_VAR, &link)
        .and_then(|()| persistence.persist(PROFILE_VAR, PROFILE_LABEL));

    match result {
        Ok(()) => PersistenceOutcome::Persisted,
        Err(AwspsError::PersistenceUnsupported(platform)) => {
            PersistenceOutcome::Unsupported(platform)
        }
        Err(e) => {
            warn!("could not persist environment: {}", e);
            PersistenceOutcome::Failed(e.to_string())
        }
    }
}

/// Fail unless `configure` has been run
pub fn check_configuration(paths: &Paths) -> Result<()> {
    if !paths.aws_dir.exists() {
        return Err(AwspsError::Unconfigured(
            "You do not have a credentials file in the default directory!".to_string(),
        ));
    }

    if !LinkStatus::detect(&paths.link_path).exists() {
        return Err(AwspsError::unconfigured());
    }

    Ok(())
}

/// Remove the link and the profile store, then try to clear the environment variables
pub fn uninstall(paths: &Paths, persistence: &dyn EnvPersistence) -> Result<UninstallReport> {
    let link_removed = remove_link(paths)?;
    let store_removed = remove_store(paths)?;

    let mut report = UninstallReport {
        link_removed,
        store_removed,
        ..Default::default()
    };
    for var in [CREDENTIALS_FILE_VAR, PROFILE_VAR] {
        match persistence.revert(var) {
            Ok(()) => {}
            Err(AwspsError::PersistenceUnsupported(platform)) => {
                // same answer for every variable
                report.persistence_unsupported = Some(platform);
                break;
            }
            Err(e) => report.warnings.push(e.to_string()),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{NewProfile, append_profile};
    use crate::env::Unsupported;
    use crate::env::testing::RecordingPersistence;
    use crate::link::{current_profile, set_aws_profile};
    use crate::store::list_profiles;
    use crate::test_utils::{ALPHA_BETA, setup_test_paths, setup_with_credentials};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_configure_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        let persistence = RecordingPersistence::default();

        let report = configure(&paths, &persistence).unwrap();
        assert_eq!(report.store.written, vec!["alpha", "beta"]);
        assert!(report.link_created);
        assert_eq!(report.persistence, PersistenceOutcome::Persisted);
        assert_eq!(
            persistence.persisted.borrow().as_slice(),
            &[
                (
                    CREDENTIALS_FILE_VAR.to_string(),
                    paths.link_path.to_string_lossy().into_owned()
                ),
                (PROFILE_VAR.to_string(), PROFILE_LABEL.to_string()),
            ]
        );

        assert_eq!(list_profiles(&paths).unwrap(), vec!["alpha", "beta"]);
        set_aws_profile(&paths, "beta").unwrap();
        assert_eq!(current_profile(&paths).unwrap(), "beta");
    }

    #[test]
    fn test_configure_twice_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        let persistence = RecordingPersistence::default();

        configure(&paths, &persistence).unwrap();
        fs::write(paths.profile_file("alpha"), "manual edit").unwrap();

        let second = configure(&paths, &persistence).unwrap();
        assert!(second.store.written.is_empty());
        assert!(!second.link_created);
        assert_eq!(second.persistence, PersistenceOutcome::Skipped);
        assert_eq!(persistence.persisted.borrow().len(), 2);

        assert_eq!(list_profiles(&paths).unwrap(), vec!["alpha", "beta"]);
        assert_eq!(
            fs::read_to_string(paths.profile_file("alpha")).unwrap(),
            "manual edit"
        );
    }

    #[test]
    fn test_configure_reports_unsupported_and_failed_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        let report = configure(&paths, &Unsupported { platform: "plan9" }).unwrap();
        assert_eq!(report.persistence, PersistenceOutcome::Unsupported("plan9"));

        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        let failing = RecordingPersistence {
            fail: true,
            ..Default::default()
        };
        let report = configure(&paths, &failing).unwrap();
        assert!(matches!(report.persistence, PersistenceOutcome::Failed(_)));
        assert!(report.link_created);
    }

    #[test]
    fn test_configure_without_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let err = configure(&paths, &RecordingPersistence::default()).unwrap_err();
        assert!(matches!(err, AwspsError::CredentialsNotFound { .. }));
        assert!(!paths.link_path.exists());
    }

    #[test]
    fn test_added_profile_appears_after_sync() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        configure(&paths, &RecordingPersistence::default()).unwrap();

        append_profile(
            &paths.credentials_file,
            &NewProfile {
                name: "gamma".to_string(),
                access_key_id: "E".to_string(),
                secret_access_key: "F".to_string(),
            },
        )
        .unwrap();

        let report = sync_profiles(&paths).unwrap();
        assert_eq!(report.written, vec!["gamma"]);
        assert!(list_profiles(&paths).unwrap().contains(&"gamma".to_string()));
    }

    #[test]
    fn test_check_configuration() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        assert!(matches!(
            check_configuration(&paths),
            Err(AwspsError::Unconfigured(msg)) if msg.contains("credentials file")
        ));

        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        assert!(check_configuration(&paths).is_err());

        configure(&paths, &RecordingPersistence::default()).unwrap();
        check_configuration(&paths).unwrap();
    }

    #[test]
    fn test_uninstall() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        let persistence = RecordingPersistence::default();
        configure(&paths, &persistence).unwrap();

        let report = uninstall(&paths, &persistence).unwrap();
        assert!(report.link_removed && report.store_removed);
        assert!(report.warnings.is_empty());
        assert_eq!(
            persistence.reverted.borrow().as_slice(),
            &[CREDENTIALS_FILE_VAR.to_string(), PROFILE_VAR.to_string()]
        );
        assert!(!paths.profiles_dir.exists());
        assert!(paths.credentials_file.exists());
        assert!(matches!(
            current_profile(&paths),
            Err(AwspsError::Unconfigured(_))
        ));

        let again = uninstall(&paths, &Unsupported { platform: "plan9" }).unwrap();
        assert!(!again.link_removed && !again.store_removed);
        assert_eq!(again.persistence_unsupported, Some("plan9"));
        assert!(again.warnings.is_empty());
    }

    #[test]
    fn test_uninstall_collects_revert_failures() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        configure(&paths, &RecordingPersistence::default()).unwrap();

        let failing = RecordingPersistence {
            fail: true,
            ..Default::default()
        };
        let report = uninstall(&paths, &failing).unwrap();
        assert!(report.link_removed && report.store_removed);
        assert_eq!(report.persistence_unsupported, None);
        assert_eq!(report.warnings.len(), 2);
    }
}
