//! Validated schema of a raw asset record

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::ReleaseType;

/// Untyped record as delivered by an asset source
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Malformed asset record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Asset record is missing {0}")]
    MissingField(&'static str),

    #[error("Invalid {field} in asset record: {value}")]
    InvalidVersion { field: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RealUpdateAttributes {
    #[serde(rename = "RealUpdateURL")]
    pub url: Option<String>,
    #[serde(rename = "RealUpdateDownloadSize")]
    pub download_size: Option<u64>,
}

/// Fields of an asset record. `Build` and `OSVersion` are mandatory;
/// everything else is optional here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetEntry {
    #[serde(rename = "Build")]
    pub build: String,
    #[serde(rename = "OSVersion")]
    pub os_version: String,
    #[serde(rename = "SUDocumentationID")]
    pub documentation_id: Option<String>,
    #[serde(rename = "ReleaseType", default)]
    pub release_type: ReleaseType,
    #[serde(rename = "AllowableOTA")]
    pub allowable_ota: Option<bool>,
    #[serde(rename = "AutoUpdate")]
    pub auto_update: Option<bool>,
    #[serde(rename = "AssetType")]
    pub asset_type: Option<String>,
    #[serde(rename = "CompatibilityVersion")]
    pub compatibility_version: Option<i64>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "MarketingVersion")]
    pub marketing_version: Option<String>,
    #[serde(rename = "PrerequisiteBuild")]
    pub prerequisite_build: Option<String>,
    #[serde(rename = "PrerequisiteOSVersion")]
    pub prerequisite_os_version: Option<String>,
    #[serde(rename = "ProductVersionExtra")]
    pub product_version_extra: Option<String>,
    #[serde(rename = "RealUpdateAttributes")]
    pub real_update: Option<RealUpdateAttributes>,
    #[serde(rename = "_DownloadSize")]
    pub download_size: Option<u64>,
    #[serde(rename = "__BaseURL")]
    pub base_url: Option<String>,
    #[serde(rename = "__RelativePath")]
    pub relative_path: Option<String>,
    #[serde(rename = "SupportedDevices", default)]
    pub supported_devices: Vec<String>,
    #[serde(rename = "SupportedDeviceModels", default)]
    pub supported_device_models: Vec<String>,
}

impl AssetEntry {
    pub fn from_raw(raw: RawRecord) -> Result<Self, RecordError> {
        Ok(serde_json::from_value(Value::Object(raw))?)
    }

    /// Download URL: `RealUpdateURL`, else `__BaseURL` + `__RelativePath`
    pub fn url(&self) -> Option<String> {
        if let Some(url) = self.real_update.as_ref().and_then(|r| r.url.clone()) {
            return Some(url);
        }
        match (&self.base_url, &self.relative_path) {
            (Some(base), Some(path)) => Some(format!("{base}{path}")),
            _ => None,
        }
    }

    pub fn size(&self) -> Option<u64> {
        self.real_update
            .as_ref()
            .and_then(|r| r.download_size)
            .or(self.download_size)
    }
}
