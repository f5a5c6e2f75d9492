//! Query request bodies

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::build::is_beta_shaped;
use crate::device::{DeviceFamily, RequestShape};

static RESTORE_BUILD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([A-Z])(\d+)").unwrap());

const BASE_URL: &str = "https://mesu.apple.com/assets/";
const MAC_BASE_URL: &str = "https://mesu.apple.com/assets/macos/";

/// Body layout of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// macOS body; `restore_version` is derived from the starting build
    Mac { restore_version: String },
    /// Standard body flagged with `ReleaseType: Beta`
    Beta,
    Standard,
}

impl RequestKind {
    /// Picks the body layout for querying `build` on a device of `family`.
    pub fn for_build(family: &DeviceFamily, build: &str, restore_version: &str) -> Self {
        match family.shape {
            RequestShape::Mac => RequestKind::Mac {
                restore_version: restore_version.to_string(),
            },
            RequestShape::Mobile if family.beta_release_type && is_beta_shaped(build) => {
                RequestKind::Beta
            }
            RequestShape::Mobile => RequestKind::Standard,
        }
    }
}

/// One asset request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub audience: String,
    pub asset_type: String,
    /// Build and version the device claims to run
    pub build: String,
    pub version: String,
    pub device: String,
    pub model: Option<String>,
    pub requested_version: Option<String>,
    pub supervised: bool,
    pub kind: RequestKind,
}

impl AssetRequest {
    pub fn to_json(&self) -> Value {
        match &self.kind {
            RequestKind::Mac { restore_version } => json!({
                "AllowSameBuildVersion": false,
                "AssetAudience": self.audience,
                "AssetType": self.asset_type,
                "BaseUrl": MAC_BASE_URL,
                "Build": self.build,
                "BuildVersion": self.build,
                "ClientData": {
                    "AllowXmlFallback": false,
                    "DeviceAccessClient": "softwareupdated"
                },
                "ClientVersion": 2,
                "DelayRequested": false,
                "DeviceName": "Mac",
                "DeviceOSData": {},
                "HWModelStr": self.model,
                "InternalBuild": false,
                "NoFallback": true,
                "ProductType": self.device,
                "ProductVersion": self.version,
                "RequestedVersion": self.requested_version,
                "RestoreVersion": restore_version,
                "Supervised": self.supervised
            }),
            RequestKind::Beta | RequestKind::Standard => {
                let mut body = json!({
                    "AllowSameBuildVersion": false,
                    "AllowSameRestoreVersion": false,
                    "AssetAudience": self.audience,
                    "AssetType": self.asset_type,
                    "BaseUrl": BASE_URL,
                    "Build": self.build,
                    "BuildVersion": self.build,
                    "ClientData": {
                        "AllowXmlFallback": false,
                        "DeviceAccessClient": "softwareupdateservicesd"
                    },
                    "ClientVersion": 2,
                    "DelayRequested": self.supervised,
                    "DeviceOSData": {
                        "BuildVersion": self.build,
                        "HWModelStr": self.model,
                        "ProductType": self.device,
                        "ProductVersion": self.version
                    },
                    "HWModelStr": self.model,
                    "InternalBuild": false,
                    "IsUIBuild": true,
                    "NoFallback": true,
                    "ProductType": self.device,
                    "ProductVersion": self.version,
                    "RequestedProductVersion": self.version,
                    "SigningFuse": true,
                    "Supervised": self.supervised
                });
                if self.kind == RequestKind::Beta {
                    body["ReleaseType"] = json!("Beta");
                }
                body
            }
        }
    }
}

/// Restore version of a macOS build: `22A380` -> `22.1.380.0.0,0`
pub fn restore_version(build: &str) -> Option<String> {
    let captures = RESTORE_BUILD_RE.captures(build)?;
    let letter = captures[2].bytes().next()?;
    Some(format!(
        "{}.{}.{}.0.0,0",
        &captures[1],
        letter - b'@',
        &captures[3]
    ))
}
