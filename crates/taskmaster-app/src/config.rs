//! Layered TOML configuration: CLI flags, then the config file, then defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use taskmaster_core::view::{FilterMode, SortKey, ViewState};
use tracing::debug;

use crate::export::ExportFormat;

const APP_DIR: &str = "taskmaster";
const CONFIG_FILE: &str = "config.toml";
const DATA_FILE: &str = "tasks.json";

/// User configuration loaded from `<config_dir>/taskmaster/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Where the task file lives.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Export defaults.
    #[serde(default)]
    pub export: ExportConfig,
    /// Initial view selections.
    #[serde(default)]
    pub view: ViewConfig,
}

/// `[storage]` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Task file path; the platform data directory is used when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[export]` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Output directory; the working directory when absent.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Default export format.
    #[serde(default)]
    pub format: ExportFormat,
}

/// `[view]` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    /// Initial sort key.
    #[serde(default)]
    pub sort: SortKey,
    /// Initial status filter.
    #[serde(default)]
    pub filter: FilterMode,
}

impl ViewConfig {
    /// Fresh view state seeded with these selections.
    #[must_use]
    pub fn initial_state(&self) -> ViewState {
        ViewState::new(self.sort, self.filter)
    }
}

impl AppConfig {
    /// Platform default location of the config file, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. The default location is optional and
    /// yields built-in defaults when missing.
    ///
    /// # Errors
    /// Returns an error naming the file when it cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                debug!(path = %path.display(), "No config file; using defaults");
                Ok(Self::default())
            }
            None => {
                debug!("No config directory on this platform; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    /// Returns an error naming the file when it cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error for invalid TOML, unknown keys or unknown option values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self
            .storage
            .path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            bail!("storage.path must not be empty");
        }
        Ok(())
    }

    /// Task file to use: `override_path`, then `[storage] path`, then the
    /// platform data directory.
    ///
    /// # Errors
    /// Returns an error when no location can be determined.
    pub fn data_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = override_path.or(self.storage.path.as_deref()) {
            return Ok(path.to_path_buf());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(DATA_FILE))
            .ok_or_else(|| anyhow!("could not determine a data directory; pass --data"))
    }

    /// Export directory: `override_dir`, then `[export] dir`, then `.`.
    #[must_use]
    pub fn export_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .or(self.export.dir.as_deref())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}
