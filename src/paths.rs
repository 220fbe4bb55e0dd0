use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

use crate::error::AwspsError;

/// All computed paths used by awsps
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~
    pub home_dir: PathBuf,
    /// ~/.aws
    pub aws_dir: PathBuf,
    /// ~/.aws/credentials
    pub credentials_file: PathBuf,
    /// ~/.aws/profiles
    pub profiles_dir: PathBuf,
    /// ~/.aws/chosenProfile
    pub link_path: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        Ok(Self::from_home(base_dirs.home_dir()))
    }

    /// Lay out every path under an explicit home directory
    pub fn from_home(home: &Path) -> Self {
        let aws_dir = home.join(".aws");

        Self {
            home_dir: home.to_path_buf(),
            credentials_file: aws_dir.join("credentials"),
            profiles_dir: aws_dir.join("profiles"),
            link_path: aws_dir.join("chosenProfile"),
            aws_dir,
        }
    }

    /// Get the path to a specific profile file
    pub fn profile_file(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(name)
    }

    /// Check if a path is within the profiles directory
    pub fn is_in_profiles_dir(&self, path: &Path) -> bool {
        path.starts_with(&self.profiles_dir)
    }

    /// Ensure the profiles directory exists
    pub fn ensure_profiles_dir(&self) -> crate::error::Result<()> {
        std::fs::create_dir_all(&self.profiles_dir)
            .map_err(|e| AwspsError::io("create profiles directory", &self.profiles_dir, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_profile_file_path() {
        let paths = Paths::from_home(Path::new("/home/someone"));
        assert_eq!(
            paths.profile_file("work"),
            PathBuf::from("/home/someone/.aws/profiles/work")
        );
        assert_eq!(paths.link_path, PathBuf::from("/home/someone/.aws/chosenProfile"));
    }

    #[test]
    fn test_is_in_profiles_dir() {
        let paths = Paths::from_home(Path::new("/home/someone"));
        assert!(paths.is_in_profiles_dir(&paths.profile_file("test")));
        assert!(!paths.is_in_profiles_dir(&paths.credentials_file));
    }

    #[test]
    fn test_ensure_profiles_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::from_home(temp_dir.path());
        paths.ensure_profiles_dir().unwrap();
        assert!(paths.profiles_dir.is_dir());
        // Second call is a no-op
        paths.ensure_profiles_dir().unwrap();
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_new_follows_home() {
        let temp_dir = TempDir::new().unwrap();
        let previous = std::env::var_os("HOME");

        // SAFETY: serialized with every other test that touches the environment
        unsafe { std::env::set_var("HOME", temp_dir.path()) };
        let paths = Paths::new().unwrap();
        match previous {
            Some(home) => unsafe { std::env::set_var("HOME", home) },
            None => unsafe { std::env::remove_var("HOME") },
        }

        assert_eq!(paths.aws_dir, temp_dir.path().join(".aws"));
    }
}
