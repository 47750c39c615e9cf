// Local configuration for the CLI.
//
// Config directory: `$GDOC_CONFIG_DIR`, else `~/.config/gdoc`.
// Config file: `<config_dir>/config.toml` (optional).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing::warn;

pub const CONFIG_DIR_ENV: &str = "GDOC_CONFIG_DIR";

/// Root directory for gdoc configuration and state.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|h| h.join(".config").join("gdoc"))
}

pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join("config.toml")
}

// ── Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GdocConfig {
    /// Directory for per-document state records (defaults to `<config_dir>/state`).
    pub state_dir: Option<PathBuf>,
    pub api: ApiConfig,
}

impl GdocConfig {
    /// Load from `<config_dir>/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load(config_dir: &Path) -> Self {
        let path = config_path(config_dir);
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unusable config file");
                Self::default()
            }
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    pub fn state_dir(&self, config_dir: &Path) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| config_dir.join("state"))
    }
}

/// Remote endpoints and transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub drive_base_url: String,
    pub upload_base_url: String,
    pub docs_base_url: String,
    /// Comments per listing page.
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            drive_base_url: "https://www.googleapis.com/drive/v3/".into(),
            upload_base_url: "https://www.googleapis.com/upload/drive/v3/".into(),
            docs_base_url: "https://docs.googleapis.com/v1/".into(),
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(std::io::Error),
    #[error("config parse error: {0}")]
    Parse(toml::de::Error),
}
