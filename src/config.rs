use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Source-related constants
// =============================================================================

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Query service endpoint
pub const DEFAULT_GDMF_URL: &str = "https://gdmf.apple.com/v2/assets";

/// Only feeds under this path are fetched remotely
pub const MESU_ASSET_PREFIX: &str = "://mesu.apple.com/assets/";

pub const DEFAULT_LOG_LEVEL: &str = "info";

const BUILD_INFO_FILE: &str = "BuildInfo.plist";
const DEVICE_INFO_FILE: &str = "DeviceInfo.plist";

/// Application configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub data: DataConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            data: DataConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Remote source configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SourcesConfig {
    pub gdmf_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            gdmf_url: DEFAULT_GDMF_URL.to_string(),
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

/// Metadata file locations; unset paths resolve inside the data directory
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DataConfig {
    pub build_info: Option<PathBuf>,
    pub device_info: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn build_info_path(&self) -> PathBuf {
        self.data
            .build_info
            .clone()
            .unwrap_or_else(|| data_dir().join(BUILD_INFO_FILE))
    }

    pub fn device_info_path(&self) -> PathBuf {
        self.data
            .device_info
            .clone()
            .unwrap_or_else(|| data_dir().join(DEVICE_INFO_FILE))
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sources.timeout_ms)
    }
}

/// Returns the path to the data directory for ota-catalog.
/// Uses $XDG_DATA_HOME/ota-catalog if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/ota-catalog,
/// or ./ota-catalog if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("ota-catalog.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("ota-catalog")
}
