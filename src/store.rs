//! Profile store.
//!
//! Every parsed credentials block is materialized as `~/.aws/profiles/<name>`. Files are
//! written once and never overwritten, so manual edits to a materialized profile survive
//! re-running `awsps configure`.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;

use crate::credentials::ProfileBlock;
use crate::error::{AwspsError, Result};
use crate::paths::Paths;

/// Outcome of a materialization pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreReport {
    /// Profiles written during this pass
    pub written: Vec<String>,
    /// Profiles that already had a file
    pub skipped: Vec<String>,
}

/// Validate profile name
///
/// Names become file names inside the profiles directory. Anything that could not be a
/// single entry there is rejected: path separators, NUL, `.`/`..` and leading dots
/// (reserved for staging entries). Spaces, colons and non-ASCII characters are fine.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AwspsError::InvalidValues(
            "profile name cannot be empty".to_string(),
        ));
    }

    if name.starts_with('.') {
        return Err(AwspsError::InvalidValues(format!(
            "profile name '{}' cannot start with a dot",
            name
        )));
    }

    if name.contains(['/', '\\', '\0']) {
        return Err(AwspsError::InvalidValues(format!(
            "profile name '{}' cannot contain path separators",
            name
        )));
    }

    Ok(())
}

/// Write one file per profile, skipping profiles that already have one
pub fn materialize_profiles(
    paths: &Paths,
    profiles: &BTreeMap<String, ProfileBlock>,
) -> Result<StoreReport> {
    paths.ensure_profiles_dir()?;

    let mut report = StoreReport::default();
    for (name, block) in profiles {
        if let Err(e) = validate_profile_name(name) {
            warn!("not materializing profile '{}': {}", name, e);
            continue;
        }

        let file = paths.profile_file(name);
        // symlink_metadata so that any existing entry counts, even a broken link
        if fs::symlink_metadata(&file).is_ok() {
            debug!("profile file exists, skipping: {}", file.display());
            report.skipped.push(name.clone());
            continue;
        }

        fs::write(&file, block.normalized())
            .map_err(|e| AwspsError::io("write profile file", &file, e))?;
        debug!("wrote profile file: {}", file.display());
        report.written.push(name.clone());
    }

    Ok(report)
}

/// List available profiles
pub fn list_profiles(paths: &Paths) -> Result<Vec<String>> {
    let entries = match fs::read_dir(&paths.profiles_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AwspsError::io("read profiles directory", &paths.profiles_dir, e)),
    };

    let mut profiles = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| AwspsError::io("read profiles directory", &paths.profiles_dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !name.starts_with('.') {
                profiles.push(name.to_string());
            }
        }
    }
    profiles.sort();
    Ok(profiles)
}

/// Check if a profile file exists
pub fn profile_exists(paths: &Paths, name: &str) -> bool {
    validate_profile_name(name).is_ok() && paths.profile_file(name).is_file()
}

/// Remove the profiles directory and everything in it
pub fn remove_store(paths: &Paths) -> Result<bool> {
    if !paths.profiles_dir.exists() {
        return Ok(false);
    }

    fs::remove_dir_all(&paths.profiles_dir)
        .map_err(|e| AwspsError::io("remove profiles directory", &paths.profiles_dir, e))?;
    debug!("removed {}", paths.profiles_dir.display());
    Ok(true)
}
