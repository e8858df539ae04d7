use crate::constants::{
    APP_DIR, DEFAULT_ARCHIVE_DIR, DEFAULT_PROJECTS_DIR, DEFAULT_RETENTION_DAYS,
    DEFAULT_WORKSPACE_DIR, SETTINGS_FILE,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional on-disk settings at `<config-dir>/reclaim/settings.toml`.
/// Command-line flags take precedence over every key.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub workspace_root: Option<String>,
    pub archive_root: Option<String>,
    pub logs_dir: Option<String>,
    pub retention_days: Option<u32>,
    pub scan_roots: Vec<String>,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .as_deref()
            .map_or_else(|| home().join(DEFAULT_WORKSPACE_DIR), expand_tilde)
    }

    pub fn archive_root(&self) -> PathBuf {
        self.archive_root
            .as_deref()
            .map_or_else(|| home().join(DEFAULT_ARCHIVE_DIR), expand_tilde)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.logs_dir.as_deref().map_or_else(
            || {
                dirs::data_local_dir()
                    .unwrap_or_else(home)
                    .join(APP_DIR)
                    .join("logs")
            },
            expand_tilde,
        )
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS)
    }

    pub fn scan_roots(&self) -> Vec<PathBuf> {
        if self.scan_roots.is_empty() {
            return vec![home().join(DEFAULT_PROJECTS_DIR)];
        }
        self.scan_roots.iter().map(|r| expand_tilde(r)).collect()
    }
}

pub fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return home();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home().join(rest),
        None => PathBuf::from(path),
    }
}
