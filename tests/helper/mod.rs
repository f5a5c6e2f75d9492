//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use ota_catalog::build::BuildInfo;
use ota_catalog::package::RawRecord;
use ota_catalog::source::{AssetRequest, QueryResponse, QuerySource, SourceError, StaticFeed};

/// iOS 11.4 through 12.1 with one beta override and one dated build
pub fn fixture_lookup() -> Arc<BuildInfo> {
    Arc::new(
        BuildInfo::from_value(json!({
            "iOS": {
                "11.4": { "15F79": {} },
                "11.4.1": { "15G77": {} },
                "12.0": {
                    "16A5354b": { "Beta": 4 },
                    "16A366": {}
                },
                "12.0.1": { "16A404": { "Date": "20181008" } },
                "12.1": { "16B92": {} }
            }
        }))
        .unwrap(),
    )
}

/// Builder for raw feed records
pub struct AssetBuilder {
    value: Value,
}

impl AssetBuilder {
    pub fn new(build: &str, os_version: &str) -> Self {
        Self {
            value: json!({
                "Build": build,
                "OSVersion": os_version,
                "SupportedDevices": ["iPhone10,3"],
                "__BaseURL": "http://appldnld.apple.com/ios12/",
                "__RelativePath": format!("091-00001-20180917-A/com_apple_MobileAsset_SoftwareUpdate/{}.zip", hex_for(build)),
                "_DownloadSize": 1000
            }),
        }
    }

    pub fn prerequisite(mut self, build: &str, version: &str) -> Self {
        self.value["PrerequisiteBuild"] = json!(build);
        self.value["PrerequisiteOSVersion"] = json!(version);
        self
    }

    pub fn devices(mut self, devices: &[&str]) -> Self {
        self.value["SupportedDevices"] = json!(devices);
        self
    }

    pub fn models(mut self, models: &[&str]) -> Self {
        self.value["SupportedDeviceModels"] = json!(models);
        self
    }

    pub fn documentation(mut self, id: &str) -> Self {
        self.value["SUDocumentationID"] = json!(id);
        self
    }

    pub fn installable(mut self, allowed: bool) -> Self {
        self.value["AllowableOTA"] = json!(allowed);
        self
    }

    /// Shares a file between records by pointing them at the same path
    pub fn file(mut self, name: &str) -> Self {
        self.value["__RelativePath"] = json!(format!(
            "091-00001-20180917-A/com_apple_MobileAsset_SoftwareUpdate/{}.zip",
            hex_for(name)
        ));
        self
    }

    pub fn build(self) -> RawRecord {
        serde_json::from_value(self.value).unwrap()
    }
}

/// Forty hex characters derived from `seed`, stable across calls
pub fn hex_for(seed: &str) -> String {
    let digest = seed
        .bytes()
        .fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    format!("{:040x}", digest)
}

pub fn static_feed(assets: Vec<RawRecord>) -> Arc<StaticFeed> {
    Arc::new(StaticFeed::new(assets))
}

/// Query source answering from a table keyed by requested build
#[derive(Default)]
pub struct ScriptedQuerySource {
    responses: HashMap<String, QueryResponse>,
    requests: Mutex<Vec<AssetRequest>>,
}

impl ScriptedQuerySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, build: &str, posting_date: &str, assets: Vec<RawRecord>) -> Self {
        self.responses.insert(
            build.to_string(),
            QueryResponse {
                posting_date: Some(posting_date.to_string()),
                assets,
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<AssetRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuerySource for ScriptedQuerySource {
    async fn query(&self, request: &AssetRequest) -> Result<QueryResponse, SourceError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .responses
            .get(&request.build)
            .cloned()
            .unwrap_or_default())
    }
}
