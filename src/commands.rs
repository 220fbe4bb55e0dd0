//! High-level command orchestration for the CLI.
//!
//! This module contains the handler functions for each CLI command (`configure`, `list`,
//! `use`, etc.). It serves as the coordination layer, interacting with:
//! - `crate::ui` for user interaction (output, prompts).
//! - `crate::paths` for filesystem locations.
//! - `crate::bootstrap` for setup and teardown.
//! - `crate::credentials` and `crate::store` for profile data.
//! - `crate::link` for profile activation.
//!
//! Each function here generally corresponds to a subcommand in `main.rs`.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use std::fs;

use crate::bootstrap::{self, PersistenceOutcome};
use crate::credentials::{NewProfile, append_profile};
use crate::doctor::run_doctor;
use crate::env::{EnvPersistence, manual_exports};
use crate::link::{
    LinkStatus, SwitchOutcome, check_permissions, current_profile, set_aws_profile,
};
use crate::paths::Paths;
use crate::store::list_profiles;
use crate::ui::Ui;

/// Configure the system to use awsps
pub fn configure(paths: &Paths, ui: &Ui, persistence: &dyn EnvPersistence) -> Result<()> {
    let spinner = ui.spinner("Configuring awsps...");
    let report = match bootstrap::configure(paths, persistence) {
        Ok(report) => report,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context("Configuration failed");
        }
    };

    match &report.persistence {
        PersistenceOutcome::Persisted => ui.spinner_finish_ok(
            &spinner,
            "Your AWS profile switcher environment has been configured. Please restart your shell to begin using it!",
        ),
        PersistenceOutcome::Skipped => ui.spinner_finish_ok(&spinner, "awsps is already configured"),
        PersistenceOutcome::Unsupported(platform) => {
            ui.spinner_finish_warn(
                &spinner,
                format!("Environment variables cannot be persisted automatically on {}", platform),
            );
            print_manual_exports(paths, ui);
        }
        PersistenceOutcome::Failed(reason) => {
            ui.spinner_finish_warn(&spinner, format!("Could not persist environment variables: {}", reason));
            print_manual_exports(paths, ui);
        }
    }

    if !report.store.written.is_empty() {
        ui.info(format!(
            "Materialized {} profile(s): {}",
            report.store.written.len(),
            report.store.written.join(", ")
        ));
    }
    if report.link_created {
        ui.info(format!("Created {}", paths.link_path.display()));
    }

    Ok(())
}

fn print_manual_exports(paths: &Paths, ui: &Ui) {
    ui.println("Add the following to your shell profile:");
    for line in manual_exports(&paths.link_path) {
        ui.println(format!("  {}", ui.bold(line)));
    }
}

/// Show the current/active profile
pub fn current(paths: &Paths, ui: &Ui) -> Result<()> {
    let name = current_profile(paths)?;
    ui.println(format!("You are currently using the profile: {}", ui.bold(&name)));

    let status = LinkStatus::detect(&paths.link_path);
    let mut table = ui.simple_table();

    if let Some(target) = status.target() {
        table.add_row(vec![ui.cell("Link target:"), ui.cell(target.display().to_string())]);
    }

    if let Ok(modified) = fs::symlink_metadata(&paths.link_path).and_then(|m| m.modified()) {
        let switched: DateTime<Local> = modified.into();
        table.add_row(vec![
            ui.cell("Last switched:"),
            ui.cell(switched.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    ui.println(ui.dim(table.to_string()));

    if matches!(status, LinkStatus::Dangling { .. }) {
        ui.warn(format!(
            "Profile '{}' has not been materialized. Switch with \"awsps use <name>\"",
            name
        ));
    }

    Ok(())
}

/// List all available profiles, marking the active one
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    bootstrap::check_configuration(paths)?;
    bootstrap::sync_profiles(paths)?;

    let profiles = list_profiles(paths)?;
    let current = current_profile(paths)?;

    if profiles.is_empty() {
        ui.warn("No profiles found.");
        ui.println(format!(
            "Add one with {} or edit {}",
            ui.bold("awsps add"),
            paths.credentials_file.display()
        ));
        return Ok(());
    }

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Profile"),
        ui.header_cell("Status"),
    ]);

    for name in &profiles {
        let is_active = *name == current;
        let icon = if is_active { ui.icon_ok() } else { " " };
        let (label, status_cell) = if is_active {
            (
                format!("{} <--", name),
                ui.colored_cell("active", comfy_table::Color::Green),
            )
        } else {
            (name.clone(), ui.cell("-"))
        };
        table.add_row(vec![ui.cell(icon), ui.cell(label), status_cell]);
    }

    ui.section("Available Profiles");
    ui.println(table.to_string());

    if !profiles.contains(&current) {
        ui.warn(format!("Active profile '{}' has no profile file", current));
    }

    Ok(())
}

/// Switch to a profile, prompting for one when no name is given
pub fn use_profile(paths: &Paths, name: Option<&str>, ui: &Ui) -> Result<()> {
    bootstrap::check_configuration(paths)?;
    check_permissions(paths)?;
    bootstrap::sync_profiles(paths)?;

    let selected = match name {
        Some(name) => name.to_string(),
        None => select_profile(paths)?,
    };

    let outcome = set_aws_profile(paths, &selected)
        .with_context(|| format!("Could not switch to '{}'", selected))?;

    match outcome {
        SwitchOutcome::Switched => ui.ok(format!(
            "Your AWS cli has been set to use the profile: {}.",
            selected
        )),
        SwitchOutcome::NotFound => {
            ui.warn(format!(
                "Profile '{}' does not exist, the active profile is unchanged.",
                selected
            ));
            ui.println("Hint: Use 'awsps list' to see available profiles.");
        }
    }
    Ok(())
}

fn select_profile(paths: &Paths) -> Result<String> {
    let profiles = list_profiles(paths)?;
    if profiles.is_empty() {
        bail!("No profiles available.\nHint: Use 'awsps add' to create one.");
    }

    let current = current_profile(paths)?;
    let cursor = profiles.iter().position(|p| *p == current).unwrap_or(0);

    Select::new("<----AWS Profile Selection---->", profiles)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Profile selection cancelled")
}

/// Values for `awsps add`; anything missing is prompted for
#[derive(Debug, Default, Clone)]
pub struct AddArgs {
    pub name: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Append a new profile to the credentials file
pub fn add(paths: &Paths, ui: &Ui, args: AddArgs) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => Text::new("Enter a name for this profile:")
            .prompt()
            .context("Profile creation cancelled")?,
    };
    let access_key_id = match args.access_key_id {
        Some(key) => key,
        None => Text::new("Enter the access key id:")
            .prompt()
            .context("Profile creation cancelled")?,
    };
    let secret_access_key = match args.secret_access_key {
        Some(secret) => secret,
        None => Password::new("Enter the secret key:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .context("Profile creation cancelled")?,
    };

    let profile = NewProfile {
        name,
        access_key_id,
        secret_access_key,
    };
    append_profile(&paths.credentials_file, &profile)?;

    let name = profile.name.trim();
    ui.ok(format!("{} has been added as an available profile for use.", name));
    ui.println(format!("To activate it:\n  awsps use {}", name));
    Ok(())
}

/// Remove all awsps configuration
pub fn uninstall(paths: &Paths, ui: &Ui, persistence: &dyn EnvPersistence) -> Result<()> {
    let report = bootstrap::uninstall(paths, persistence)?;

    if report.link_removed {
        ui.ok(format!("Removed {}", paths.link_path.display()));
    }
    if report.store_removed {
        ui.ok(format!("Removed {}", paths.profiles_dir.display()));
    }
    if !report.link_removed && !report.store_removed {
        ui.info("Nothing to remove");
    }
    if let Some(platform) = report.persistence_unsupported {
        ui.info(format!(
            "Environment variables are not managed on {}.",
            platform
        ));
    }
    for warning in &report.warnings {
        ui.warn(warning);
    }
    if report.persistence_unsupported.is_some() || !report.warnings.is_empty() {
        ui.println("Remove AWS_SHARED_CREDENTIALS_FILE and AWS_PROFILE from your shell profile if you set them by hand.");
    }

    Ok(())
}

/// Run diagnostics
pub fn doctor(paths: &Paths, ui: &Ui) -> Result<()> {
    let failures = run_doctor(paths, ui);
    if failures > 0 {
        bail!("{} check(s) failed", failures);
    }
    ui.ok("No issues found");
    Ok(())
}
