//! Active-profile link.
//!
//! This module implements the core mechanism of `awsps`: a single symbolic link at
//! `~/.aws/chosenProfile` that points at one file in the profiles directory. The AWS CLI
//! reads its credentials through that link, so switching profiles is a matter of
//! repointing it. It handles:
//! - Detecting the state of the link (missing, dangling, not a link).
//! - Creating the initial link to the `default` profile.
//! - Replacing the link atomically when switching.

use log::{debug, info};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{AwspsError, Result};
use crate::paths::Paths;
use crate::store::validate_profile_name;

/// Profile the link points at right after configuration
pub const INITIAL_PROFILE: &str = "default";

/// Represents the status of the ~/.aws/chosenProfile entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Missing,
    /// Something other than a symbolic link occupies the path
    NotALink,
    Linked { target: PathBuf },
    /// The link exists but its target has not been materialized
    Dangling { target: PathBuf },
}

impl LinkStatus {
    pub fn detect(path: &Path) -> Self {
        // symlink_metadata does not follow the link, so a dangling link still shows up
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => match fs::read_link(path) {
                Ok(target) if path.exists() => Self::Linked { target },
                Ok(target) => Self::Dangling { target },
                Err(_) => Self::Dangling {
                    target: PathBuf::from("?"),
                },
            },
            Ok(_) => Self::NotALink,
            Err(_) => Self::Missing,
        }
    }

    pub fn exists(&self) -> bool {
        !matches!(self, Self::Missing)
    }

    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::Linked { target } | Self::Dangling { target } => Some(target),
            _ => None,
        }
    }
}

/// Create the link pointing at the `default` profile, unless it already exists.
///
/// Returns `true` when the link was created by this call. The target does not have to
/// exist yet.
pub fn initialize_link(paths: &Paths) -> Result<bool> {
    if LinkStatus::detect(&paths.link_path).exists() {
        debug!("link already present: {}", paths.link_path.display());
        return Ok(false);
    }

    let target = paths.profile_file(INITIAL_PROFILE);
    make_symlink(&target, &paths.link_path)?;
    info!(
        "created link {} -> {}",
        paths.link_path.display(),
        target.display()
    );
    Ok(true)
}

/// Name of the profile the link currently points at
pub fn current_profile(paths: &Paths) -> Result<String> {
    match LinkStatus::detect(&paths.link_path) {
        LinkStatus::Missing => Err(AwspsError::unconfigured()),
        LinkStatus::NotALink => Err(AwspsError::Unconfigured(format!(
            "{} exists but is not a link. Move it aside and run \"awsps configure\"",
            paths.link_path.display()
        ))),
        LinkStatus::Linked { target } | LinkStatus::Dangling { target } => target
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AwspsError::Unconfigured(format!(
                    "{} does not point at a profile file",
                    paths.link_path.display()
                ))
            }),
    }
}

/// Result of [`set_aws_profile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    /// No profile file with that name; the link was not touched
    NotFound,
}

/// Switch to a specific profile
///
/// The new link is created under a staging name and renamed over the old one, so the
/// link is never observed missing. If anything fails the previous link is left intact.
/// Switching to a name without a profile file is a no-op.
pub fn set_aws_profile(paths: &Paths, name: &str) -> Result<SwitchOutcome> {
    // a name that cannot be a file in the profiles dir has no profile file either
    if validate_profile_name(name).is_err() || !paths.profile_file(name).is_file() {
        debug!("no profile file for '{}', link unchanged", name);
        return Ok(SwitchOutcome::NotFound);
    }

    let target = paths.profile_file(name);
    replace_link(&target, &paths.link_path)?;
    info!("switched {} -> {}", paths.link_path.display(), target.display());
    Ok(SwitchOutcome::Switched)
}

/// Verify that the credentials file is writable and links can be created in ~/.aws
pub fn check_permissions(paths: &Paths) -> Result<()> {
    OpenOptions::new()
        .append(true)
        .open(&paths.credentials_file)
        .map_err(|e| AwspsError::io("open credentials file for writing", &paths.credentials_file, e))?;

    let scratch = paths.aws_dir.join(".awsps-check.tmp");
    remove_if_present(&scratch)?;
    let created = make_symlink(&paths.credentials_file, &scratch);
    let cleanup = remove_if_present(&scratch);
    created?;
    cleanup
}

/// Remove the link entry, if any
pub fn remove_link(paths: &Paths) -> Result<bool> {
    if !LinkStatus::detect(&paths.link_path).exists() {
        return Ok(false);
    }
    fs::remove_file(&paths.link_path)
        .map_err(|e| AwspsError::io("remove link", &paths.link_path, e))?;
    debug!("removed {}", paths.link_path.display());
    Ok(true)
}

fn replace_link(target: &Path, link: &Path) -> Result<()> {
    let staging = staging_path(link);
    remove_if_present(&staging)?;
    make_symlink(target, &staging)?;

    fs::rename(&staging, link).map_err(|e| {
        let _ = fs::remove_file(&staging);
        AwspsError::io("replace link", link, e)
    })
}

fn staging_path(link: &Path) -> PathBuf {
    let name = link
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("chosenProfile");
    link.with_file_name(format!(".{}.tmp", name))
}

fn remove_if_present(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_ok() {
        fs::remove_file(path).map_err(|e| AwspsError::io("remove", path, e))?;
    }
    Ok(())
}

fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).map_err(|e| AwspsError::io("create directory", parent, e))?;
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link)
        .map_err(|e| AwspsError::io("create link", link, e))?;

    #[cfg(windows)]
    std::os::windows::fs::symlink_file(target, link)
        .map_err(|e| AwspsError::io("create link", link, e))?;

    Ok(())
}
