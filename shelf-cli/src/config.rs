// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI configuration
//!
//! Read once at startup from `config.toml` in the user config directory, or
//! from the file given with `--config`.

use directories::ProjectDirs;
use serde::Deserialize;
use shelf_core::{ListingRules, ShelfError, ShelfResult};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account store location
    pub store: Option<PathBuf>,
    /// Account used when neither `--account` nor `--root` is given
    pub default_account: Option<String>,
    /// Hidden prefixes and extension table shared by all drivers
    pub listing: ListingRules,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "shelf", "shelf")
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load `path`, or the default location if it exists.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> ShelfResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path).map_err(|e| ShelfError::io(e, path.display().to_string()))?;
        Self::parse(&text).map_err(|e| ShelfError::ConfigInvalid(format!("{}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Account store file: flag, then config, then the user data directory
    pub fn store_path(&self, flag: Option<&Path>) -> PathBuf {
        if let Some(path) = flag.or(self.store.as_deref()) {
            return path.to_path_buf();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("accounts.json"))
            .unwrap_or_else(|| PathBuf::from("accounts.json"))
    }
}
