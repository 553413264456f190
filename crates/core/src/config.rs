//! The swc configuration file
//!
//! A single TOML document at `~/.config/swc/config.toml` holding output
//! defaults and the connection profiles. `SWC_CONFIG_DIR` relocates it.
//! Bump [`SCHEMA_VERSION`] together with a step in [`ConfigManager::migrate`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::Profile;

pub const SCHEMA_VERSION: u32 = 1;

pub const CONFIG_DIR_ENV: &str = "SWC_CONFIG_DIR";

const FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            profiles: Vec::new(),
        }
    }
}

/// Output settings applied when the matching flag is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub output: OutputFormat,

    #[serde(default)]
    pub color: ColorMode,

    #[serde(default = "progress_enabled")]
    pub progress: bool,
}

fn progress_enabled() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            color: ColorMode::default(),
            progress: progress_enabled(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Reads and writes the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Locate the file through `SWC_CONFIG_DIR` or the platform config
    /// directory
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .map(|base| base.join("swc"))
                .ok_or_else(|| Error::Config("No configuration directory on this platform".into()))?,
        };
        Ok(Self::with_path(dir.join(FILE_NAME)))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// A missing file is an empty configuration. Older schemas are migrated
    /// in memory; newer ones are refused.
    pub fn load(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };
        let config: Config = toml::from_str(&content)?;

        match config.schema_version {
            SCHEMA_VERSION => Ok(config),
            found if found < SCHEMA_VERSION => Self::migrate(config),
            found => Err(Error::Config(format!(
                "{} uses schema version {found}, this swc understands up to {SCHEMA_VERSION}; upgrade swc",
                self.config_path.display()
            ))),
        }
    }

    /// Write the file, creating its directory. Credentials live here, so on
    /// Unix the file is made private to the owner.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.config_path, toml::to_string_pretty(config)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.config_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %self.config_path.display(), "Saved configuration");
        Ok(())
    }

    fn migrate(mut config: Config) -> Result<Config> {
        // version 0 files were written before the field existed; layout is unchanged
        tracing::debug!(from = config.schema_version, to = SCHEMA_VERSION, "Migrating configuration");
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
