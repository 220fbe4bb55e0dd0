//! Test utilities shared across test modules
//!
//! This module provides common helper functions for testing, avoiding duplication
//! across multiple test suites.

use crate::paths::Paths;
use std::fs;
use tempfile::TempDir;

/// Two well-formed profiles, `alpha` and `beta`
pub const ALPHA_BETA: &str = "[alpha]\naws_access_key_id = A\naws_secret_access_key = B\n\
                              [beta]\naws_access_key_id = C\naws_secret_access_key = D\n";

/// Create a Paths struct for testing using a temporary directory as home
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths::from_home(temp_dir.path())
}

/// Like [`setup_test_paths`], with `~/.aws/credentials` already holding `credentials`
pub fn setup_with_credentials(temp_dir: &TempDir, credentials: &str) -> Paths {
    let paths = setup_test_paths(temp_dir);
    fs::create_dir_all(&paths.aws_dir).unwrap();
    fs::write(&paths.credentials_file, credentials).unwrap();
    paths
}
