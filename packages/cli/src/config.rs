//! Profiles and data locations.
//!
//! Layout under the home directory:
//! - `~/.bookthrifter/config/*.toml` - one profile per file
//! - `~/.bookthrifter/data/` - price ledger and snapshots

use anyhow::{Context, Result};
use bookthrifter::Credentials;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".bookthrifter";
pub const LEDGER_FILE_NAME: &str = "record_prices.json";

/// Where profiles are read from and results are written to.
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Paths {
    pub fn under(home: &Path) -> Self {
        let root = home.join(APP_DIR);
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    /// Paths under `$HOME`.
    pub fn from_env() -> Result<Self> {
        let home = std::env::var_os("HOME").context("HOME must be set to locate ~/.bookthrifter")?;
        Ok(Self::under(Path::new(&home)))
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE_NAME)
    }
}

/// On-disk shape of a profile. Keys other than these (e.g. old
/// notification settings) are ignored.
#[derive(Deserialize)]
struct ProfileFile {
    email: String,
    password: String,
}

/// One account to run.
#[derive(Debug, Clone)]
pub struct Profile {
    /// File stem, used in logs
    pub name: String,
    pub credentials: Credentials,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        Self::parse(&content, profile_name(path))
            .with_context(|| format!("Failed to parse profile {}", path.display()))
    }

    pub fn parse(content: &str, name: impl Into<String>) -> Result<Self> {
        let file: ProfileFile = toml::from_str(content)?;
        anyhow::ensure!(!file.email.trim().is_empty(), "`email` is empty");
        anyhow::ensure!(!file.password.is_empty(), "`password` is empty");
        Ok(Self {
            name: name.into(),
            credentials: Credentials::new(file.email.trim(), file.password),
        })
    }
}

fn profile_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Profile files in `dir`, sorted by name. Creates `dir` when missing.
pub fn discover_profiles(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut profiles = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            profiles.push(path);
        }
    }
    profiles.sort();
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let profile = Profile::parse(
            r#"
            email = " reader@example.com "
            password = "hunter2"

            [notifications]
            smtp_server = "smtp.example.com"
            "#,
            "main",
        )
        .unwrap();

        assert_eq!(profile.name, "main");
        assert_eq!(profile.credentials.email, "reader@example.com");
        assert_eq!(profile.credentials.password.expose(), "hunter2");
        assert!(!format!("{:?}", profile).contains("hunter2"));
    }

    #[test]
    fn test_parse_requires_credentials() {
        assert!(Profile::parse("email = \"a@b.c\"", "p").is_err());
        assert!(Profile::parse("email = \"\"\npassword = \"x\"", "p").is_err());
    }

    #[test]
    fn test_discover_creates_dir_and_filters() {
        let home = tempfile::tempdir().unwrap();
        let paths = Paths::under(home.path());

        assert!(discover_profiles(&paths.config_dir).unwrap().is_empty());
        assert!(paths.config_dir.is_dir());

        fs::write(paths.config_dir.join("b.toml"), "").unwrap();
        fs::write(paths.config_dir.join("a.toml"), "").unwrap();
        fs::write(paths.config_dir.join("old.conf"), "").unwrap();

        let found = discover_profiles(&paths.config_dir).unwrap();
        let names: Vec<_> = found.iter().map(|p| profile_name(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_paths() {
        let paths = Paths::under(Path::new("/home/reader")).with_data_dir("/srv/books");
        assert_eq!(paths.config_dir, Path::new("/home/reader/.bookthrifter/config"));
        assert_eq!(paths.ledger_path(), Path::new("/srv/books/record_prices.json"));
    }
}
