//! Configuration for note-sync.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marker file that identifies a notes root.
pub const ROOT_MARKER: &str = ".notes-root";

/// Environment variable overriding the configured root.
pub const ROOT_ENV: &str = "NOTE_SYNC_ROOT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Notes root; the current directory when unset.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "note-sync")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Resolve the notes root from the environment, the config and the working directory.
    pub fn resolve_root(&self) -> Result<PathBuf> {
        let env_root = std::env::var_os(ROOT_ENV).map(PathBuf::from);
        let cwd = std::env::current_dir().context("could not read current directory")?;
        self.resolve_root_from(env_root, &cwd)
    }

    fn resolve_root_from(&self, env_root: Option<PathBuf>, cwd: &Path) -> Result<PathBuf> {
        let root = env_root
            .or_else(|| self.root.clone())
            .unwrap_or_else(|| cwd.to_path_buf());
        let root = if root.is_absolute() { root } else { cwd.join(root) };

        let root = root
            .canonicalize()
            .with_context(|| format!("could not resolve notes root {}", root.display()))?;
        if !root.join(ROOT_MARKER).is_file() {
            bail!(
                "{} is not a notes root (missing {} marker)",
                root.display(),
                ROOT_MARKER
            );
        }
        Ok(root)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Print the plan before applying it.
    #[serde(default)]
    pub verbose: bool,
}
