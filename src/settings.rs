//! Front-end settings: where the config lives and how to reach it.
//!
//! Settings come from a YAML or TOML file (format chosen by extension), then
//! `COPG_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::{CopgError, Result};
use crate::profile::KeyScheme;

pub const DEFAULT_CONFIG_PATH: &str = "/data/adb/modules/COPG/config.json";
pub const DEFAULT_BACKUP_DIR: &str = "/sdcard/Download";
pub const DEFAULT_UNDO_WINDOW_SECS: u64 = 5;

/// Settings file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Yaml,
    Toml,
}

impl SettingsFormat {
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        trace!(extension = %ext, "Detecting settings format from extension");
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// How the config file is read and written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Through the privileged shell (`su -c …`).
    #[default]
    Shell,
    /// Directly on the local filesystem.
    File,
}

impl BackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shell" => Some(Self::Shell),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub config_path: String,
    pub scheme: KeyScheme,
    pub backend: BackendKind,
    pub shell: String,
    pub selinux_context: Option<String>,
    pub undo_window_secs: u64,
    pub backup_dir: String,
    pub journal_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            scheme: KeyScheme::Multi,
            backend: BackendKind::Shell,
            shell: "su".to_string(),
            selinux_context: None,
            undo_window_secs: DEFAULT_UNDO_WINDOW_SECS,
            backup_dir: DEFAULT_BACKUP_DIR.to_string(),
            journal_path: None,
        }
    }
}

impl Settings {
    /// `<config dir>/copg/settings.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("copg").join("settings.toml"))
    }

    /// Load from an explicit file; a missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let format = SettingsFormat::from_extension(path).ok_or_else(|| {
            CopgError::SettingsParse(format!(
                "Unknown settings format for '{}': expected .yaml, .yml, or .toml",
                path.display()
            ))
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CopgError::SettingsParse(format!("{} does not exist", path.display()))
            } else {
                CopgError::Io(e)
            }
        })?;
        debug!(path = %path.display(), bytes = content.len(), "Read settings file");
        Self::from_str_with(&content, format)
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_str_with(content: &str, format: SettingsFormat) -> Result<Self> {
        let settings: Self = match format {
            SettingsFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| CopgError::SettingsParse(format!("YAML: {e}")))?,
            SettingsFormat::Toml => {
                toml::from_str(content).map_err(|e| CopgError::SettingsParse(format!("TOML: {e}")))?
            }
        };
        settings.validate()?;
        info!(config = %settings.config_path, scheme = %settings.scheme, "Settings loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.config_path.trim().is_empty() {
            return Err(CopgError::SettingsParse("config_path must not be empty".into()));
        }
        if self.backend == BackendKind::Shell && self.shell.trim().is_empty() {
            return Err(CopgError::SettingsParse("shell must not be empty".into()));
        }
        Ok(())
    }

    /// Apply `COPG_CONFIG`, `COPG_SCHEME`, `COPG_BACKEND` and `COPG_SHELL`.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up by variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("COPG_CONFIG") {
            self.config_path = path;
        }
        if let Some(value) = get("COPG_SCHEME") {
            self.scheme = KeyScheme::parse(&value).ok_or_else(|| {
                CopgError::SettingsParse(format!("COPG_SCHEME: unknown scheme '{value}'"))
            })?;
        }
        if let Some(value) = get("COPG_BACKEND") {
            self.backend = BackendKind::parse(&value).ok_or_else(|| {
                CopgError::SettingsParse(format!("COPG_BACKEND: unknown backend '{value}'"))
            })?;
        }
        if let Some(shell) = get("COPG_SHELL") {
            self.shell = shell;
        }
        trace!(settings = ?self, "Environment overrides applied");
        Ok(())
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }

    /// Where the pending undo is recorded between invocations.
    pub fn journal_path(&self) -> PathBuf {
        self.journal_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("copg")
                .join("undo.json")
        })
    }

    /// Persistent activity log, kept next to the undo journal.
    pub fn activity_path(&self) -> PathBuf {
        self.journal_path().with_file_name("activity.jsonl")
    }
}
