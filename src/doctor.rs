//! Diagnostic tool for awsps.
//!
//! This module implements the `awsps doctor` command, which checks the system
//! for common issues:
//! - Existence of the AWS and profile directories.
//! - Readability of the credentials file.
//! - State of the active-profile link.
//! - Shape of the materialized profile files.
//! - Environment variables seen by the AWS CLI.
//!
//! Nothing is modified. Each step reports a pass/fail/warn status.

use anstyle::AnsiColor;
use std::env;
use std::fs;
use std::path::Path;

use crate::credentials::{DEFAULT_HEADER, read_profiles};
use crate::env::{CREDENTIALS_FILE_VAR, PROFILE_LABEL, PROFILE_VAR};
use crate::link::LinkStatus;
use crate::paths::Paths;
use crate::store::list_profiles;
use crate::ui::Ui;

/// Run the doctor diagnostics, returning the number of failed checks
pub fn run_doctor(paths: &Paths, ui: &Ui) -> usize {
    ui.section("awsps Doctor");
    ui.newline();

    let mut failures = 0;

    failures += check_step(ui, "Directories", || {
        let mut ok = true;
        if paths.aws_dir.is_dir() {
            ui.println(format!("  {} AWS directory exists: {}", ui.icon_ok(), paths.aws_dir.display()));
        } else {
            ui.println(format!("  {} AWS directory missing: {}", ui.icon_err(), paths.aws_dir.display()));
            ok = false;
        }

        if paths.profiles_dir.is_dir() {
            ui.println(format!(
                "  {} Profiles directory exists: {}",
                ui.icon_ok(),
                paths.profiles_dir.display()
            ));
        } else {
            ui.println(format!(
                "  {} Profiles directory missing (run \"awsps configure\")",
                ui.icon_warn()
            ));
        }
        ok
    });

    failures += check_step(ui, "Credentials File", || {
        match read_profiles(&paths.credentials_file) {
            Ok(parsed) => {
                ui.println(format!(
                    "  {} {} profile(s) found in {}",
                    ui.icon_ok(),
                    parsed.len(),
                    paths.credentials_file.display()
                ));
                let stored = list_profiles(paths).unwrap_or_default();
                let pending: Vec<&str> = parsed
                    .keys()
                    .filter(|name| !stored.contains(*name))
                    .map(String::as_str)
                    .collect();
                if !pending.is_empty() {
                    ui.println(format!(
                        "  {} Not materialized yet: {}",
                        ui.icon_info(),
                        pending.join(", ")
                    ));
                }
                true
            }
            Err(e) => {
                ui.println(format!("  {} {}", ui.icon_err(), e));
                false
            }
        }
    });

    failures += check_step(ui, "Active Profile Link", || {
        match LinkStatus::detect(&paths.link_path) {
            LinkStatus::Missing => {
                ui.println(format!("  {} {} is missing", ui.icon_err(), paths.link_path.display()));
                false
            }
            LinkStatus::NotALink => {
                ui.println(format!(
                    "  {} {} is not a link",
                    ui.icon_err(),
                    paths.link_path.display()
                ));
                false
            }
            LinkStatus::Linked { target } => {
                ui.println(format!("  {} Link points to: {}", ui.icon_ok(), target.display()));
                if !paths.is_in_profiles_dir(&target) {
                    ui.println(format!(
                        "  {} Target is outside the profiles directory",
                        ui.icon_warn()
                    ));
                }
                true
            }
            LinkStatus::Dangling { target } => {
                ui.println(format!(
                    "  {} DANGLING link pointing to: {}",
                    ui.icon_warn(),
                    target.display()
                ));
                ui.println("    Switch with \"awsps use <name>\" to fix it");
                true
            }
        }
    });

    failures += check_step(ui, "Profiles", || {
        let profiles = match list_profiles(paths) {
            Ok(p) => p,
            Err(e) => {
                ui.println(format!("  {} Failed to list profiles: {}", ui.icon_err(), e));
                return false;
            }
        };

        if profiles.is_empty() {
            ui.println(format!("  {} No profiles found", ui.icon_warn()));
            return true;
        }

        let mut all_valid = true;
        for name in profiles {
            if has_default_header(&paths.profile_file(&name)) {
                ui.println(format!("    {} {}", ui.icon_ok(), name));
            } else {
                ui.println(format!(
                    "    {} {} (does not start with {})",
                    ui.icon_err(),
                    name,
                    DEFAULT_HEADER
                ));
                all_valid = false;
            }
        }
        all_valid
    });

    failures += check_step(ui, "Environment", || {
        let link = paths.link_path.to_string_lossy();
        match env::var(CREDENTIALS_FILE_VAR) {
            Ok(v) if v == link => {
                ui.println(format!("  {} {} points at the link", ui.icon_ok(), CREDENTIALS_FILE_VAR))
            }
            Ok(v) => ui.println(format!(
                "  {} {} is set to {} (expected {})",
                ui.icon_warn(),
                CREDENTIALS_FILE_VAR,
                v,
                link
            )),
            Err(_) => ui.println(format!(
                "  {} {} not set in this shell (restart it after configuring)",
                ui.icon_warn(),
                CREDENTIALS_FILE_VAR
            )),
        }
        match env::var(PROFILE_VAR) {
            Ok(v) if v == PROFILE_LABEL => {
                ui.println(format!("  {} {}={}", ui.icon_ok(), PROFILE_VAR, v))
            }
            Ok(v) => ui.println(format!(
                "  {} {}={} (profile files are written as {})",
                ui.icon_warn(),
                PROFILE_VAR,
                v,
                PROFILE_LABEL
            )),
            Err(_) => ui.println(format!("  {} {} not set", ui.icon_info(), PROFILE_VAR)),
        }
        true
    });

    failures
}

fn has_default_header(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|content| content.trim_start().starts_with(DEFAULT_HEADER))
        .unwrap_or(false)
}

fn check_step<F>(ui: &Ui, name: &str, check_fn: F) -> usize
where
    F: FnOnce() -> bool,
{
    ui.println(ui.bold(format!("Checking {}...", name)));
    let success = check_fn();
    if !success {
        ui.println(ui.colored("  Issues detected!", AnsiColor::Red));
    }
    ui.newline();
    usize::from(!success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::configure;
    use crate::env::testing::RecordingPersistence;
    use crate::test_utils::{ALPHA_BETA, setup_test_paths, setup_with_credentials};
    use crate::ui::ColorMode;
    use tempfile::TempDir;

    #[test]
    fn test_doctor_unconfigured() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let ui = Ui::new(ColorMode::Never, false);
        // directories, credentials and link all fail
        assert_eq!(run_doctor(&paths, &ui), 3);
    }

    #[test]
    fn test_doctor_configured() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_with_credentials(&temp_dir, ALPHA_BETA);
        configure(&paths, &RecordingPersistence::default()).unwrap();
        let ui = Ui::new(ColorMode::Never, false);
        assert_eq!(run_doctor(&paths, &ui), 0);

        fs::write(paths.profile_file("alpha"), "garbage").unwrap();
        assert_eq!(run_doctor(&paths, &ui), 1);
    }
}
