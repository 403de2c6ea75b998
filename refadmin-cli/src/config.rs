use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, Result};

fn default_api_base_url() -> String {
    "http://localhost:8000".to_owned()
}

fn default_currency() -> String {
    "INR".to_owned()
}

/// Persistent CLI configuration, stored as TOML under the user's config dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend origin every request is issued against.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// ISO 4217 code used when rendering monetary amounts.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Override for the session token location.
    #[serde(default)]
    pub token_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            currency: default_currency(),
            token_path: None,
        }
    }
}

impl AppConfig {
    fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("refadmin"))
            .ok_or_else(|| CliError::Config("could not determine config directory".to_owned()))
    }

    fn config_path(override_path: Option<&Path>) -> Result<PathBuf> {
        match override_path {
            Some(path) => Ok(path.to_owned()),
            None => Ok(Self::config_dir()?.join("config.toml")),
        }
    }

    /// Load the configuration, falling back to defaults when no file exists.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = Self::config_path(override_path)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(path = %path.display(), "loaded configuration");
                toml::from_str(&raw)
                    .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write defaults back to the configuration file.
    pub fn reset(override_path: Option<&Path>) -> Result<()> {
        let path = Self::config_path(override_path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(&Self::default())
            .map_err(|e| CliError::Config(e.to_string()))?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    pub fn show(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Where the session credential lives.
    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.token_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("session.token")),
        }
    }
}
