//! Credentials file parsing.
//!
//! The AWS credentials file is scanned for blocks made of a `[name]` header followed by
//! exactly two `key = value` lines. Anything else in the file is ignored. Each block is
//! later written to its own profile file with the header normalized to [`DEFAULT_HEADER`],
//! so the AWS CLI always finds the active credentials under the same profile label.

use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{AwspsError, Result};
use crate::store::validate_profile_name;

/// Header written at the top of every materialized profile file
pub const DEFAULT_HEADER: &str = "[default]";

// header line, then two `key = value` lines, each separated by at most one blank line
// (LF or CRLF)
static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mR)^\[([^\]\r\n]+)\][ \t]*$(?:\r?\n){1,2}^([^\[\s=#;][^=\r\n]*=[^\r\n]*)$(?:\r?\n){1,2}^([^\[\s=#;][^=\r\n]*=[^\r\n]*)$",
    )
    .expect("valid credentials block pattern")
});

/// One `[name]` block from the credentials file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileBlock {
    pub name: String,
    /// The matched text, exactly as it appeared in the credentials file
    pub raw_text: String,
}

impl ProfileBlock {
    /// The block with its header rewritten to [`DEFAULT_HEADER`]
    pub fn normalized(&self) -> String {
        let mut out = String::from(DEFAULT_HEADER);
        out.push('\n');
        for line in self.raw_text.lines().skip(1) {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Extract every well-formed profile block from `text`.
///
/// Returns an empty map when nothing matches. When a name appears more than once the
/// last block wins.
pub fn parse_profiles(text: &str) -> BTreeMap<String, ProfileBlock> {
    let mut profiles = BTreeMap::new();

    for caps in BLOCK_PATTERN.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always participates");
        let name = caps[1].trim();

        if name.is_empty() {
            continue;
        }

        if !ends_block(&text[whole.end()..]) {
            debug!("skipping profile '{}': more than two key lines", name);
            continue;
        }

        debug!("parsed profile '{}'", name);
        profiles.insert(
            name.to_string(),
            ProfileBlock {
                name: name.to_string(),
                raw_text: whole.as_str().to_string(),
            },
        );
    }

    profiles
}

/// True when the next meaningful line after a match starts a new block (or there is none)
fn ends_block(rest: &str) -> bool {
    rest.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
        .is_none_or(|line| line.starts_with('['))
}

/// Read and parse the credentials file at `path`
pub fn read_profiles(path: &Path) -> Result<BTreeMap<String, ProfileBlock>> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AwspsError::CredentialsNotFound {
            path: path.to_path_buf(),
        },
        _ => AwspsError::io("read credentials file", path, e),
    })?;

    let profiles = parse_profiles(&text);
    debug!("found {} profile(s) in {}", profiles.len(), path.display());
    Ok(profiles)
}

/// A profile entered by the user, not yet written to the credentials file
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl NewProfile {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("profile name", &self.name),
            ("access key id", &self.access_key_id),
            ("secret access key", &self.secret_access_key),
        ];

        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(AwspsError::InvalidValues(format!("{} is required", label)));
            }
            if value.contains(['\r', '\n']) {
                return Err(AwspsError::InvalidValues(format!(
                    "{} must fit on a single line",
                    label
                )));
            }
        }

        let name = self.name.trim();
        if name.contains(['[', ']']) {
            return Err(AwspsError::InvalidValues(format!(
                "profile name '{}' cannot contain brackets",
                name
            )));
        }
        validate_profile_name(name)
    }

    fn render(&self) -> String {
        format!(
            "[{}]\naws_access_key_id = {}\naws_secret_access_key = {}\n",
            self.name.trim(),
            self.access_key_id.trim(),
            self.secret_access_key.trim()
        )
    }
}

/// Append a new profile block to the credentials file, creating it if needed
pub fn append_profile(path: &Path, profile: &NewProfile) -> Result<()> {
    profile.validate()?;

    let existing = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(AwspsError::io("read credentials file", path, e)),
    };

    let name = profile.name.trim();
    if parse_profiles(&existing).contains_key(name) {
        return Err(AwspsError::InvalidValues(format!(
            "profile '{}' already exists in {}",
            name,
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AwspsError::io("create directory", parent, e))?;
    }

    let mut block = profile.render();
    if !existing.is_empty() {
        block.insert(0, '\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AwspsError::io("open credentials file", path, e))?;
    file.write_all(block.as_bytes())
        .map_err(|e| AwspsError::io("write credentials file", path, e))?;

    debug!("appended profile '{}' to {}", name, path.display());
    Ok(())
}
