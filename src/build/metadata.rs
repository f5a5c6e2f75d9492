//! Read-only build metadata lookup
//!
//! `BuildInfo` maps `OS family -> version -> build -> overrides`. It is loaded
//! once and shared between ingestion tasks.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::device::OsFamily;
use crate::source::plist::{self, PlistError};

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read metadata file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid metadata plist: {0}")]
    Plist(#[from] PlistError),
}

/// Overrides recorded for a single build
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildEntry {
    pub beta: Option<u32>,
    pub suffix: Option<String>,
    /// Restricts the overrides to these device models
    pub models: Option<Vec<String>>,
    pub date: Option<String>,
    /// Keys without a dedicated field, kept so they still count as content
    #[serde(flatten)]
    pub other: IndexMap<String, serde_json::Value>,
}

impl BuildEntry {
    /// True when the entry has no keys at all, recognized or not.
    pub fn is_empty(&self) -> bool {
        self.beta.is_none()
            && self.suffix.is_none()
            && self.models.is_none()
            && self.date.is_none()
            && self.other.is_empty()
    }

    /// Returns true if the overrides apply to a record supporting `models`.
    pub fn visible_to(&self, models: &[String]) -> bool {
        match &self.models {
            Some(restricted) => restricted.iter().any(|m| models.contains(m)),
            None => true,
        }
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    /// Version label the build is filed under (e.g. `12.0`)
    pub version: String,
    pub entry: BuildEntry,
}

/// Read-only access to build metadata
#[cfg_attr(test, automock)]
pub trait BuildMetadataLookup: Send + Sync {
    /// Finds `build` for `family`; the first version (in file order) listing it wins.
    fn lookup(&self, family: OsFamily, build: &str) -> Option<BuildMetadata>;

    /// All versions of `family` in file order, each with its builds in file order
    fn releases(&self, family: OsFamily) -> Vec<(String, Vec<String>)>;
}

type Builds = IndexMap<String, BuildEntry>;

/// Build metadata backed by a JSON document or a property list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct BuildInfo {
    families: IndexMap<String, IndexMap<String, Builds>>,
}

impl BuildInfo {
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, MetadataError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Loads a `.plist` or JSON file.
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = std::fs::read_to_string(path)?;
        let info = if is_plist(path) {
            Self::from_value(plist::from_str(&content)?)?
        } else {
            Self::from_json(&content)?
        };

        debug!(
            "Loaded build metadata for {} OS families from {}",
            info.families.len(),
            path.display()
        );
        Ok(info)
    }

    fn versions(&self, family: OsFamily) -> Option<&IndexMap<String, Builds>> {
        self.families.get(family.as_str())
    }
}

impl BuildMetadataLookup for BuildInfo {
    fn lookup(&self, family: OsFamily, build: &str) -> Option<BuildMetadata> {
        self.versions(family)?
            .iter()
            .find_map(|(version, builds)| {
                builds.get(build).map(|entry| BuildMetadata {
                    version: version.clone(),
                    entry: entry.clone(),
                })
            })
    }

    fn releases(&self, family: OsFamily) -> Vec<(String, Vec<String>)> {
        self.versions(family)
            .map(|versions| {
                versions
                    .iter()
                    .map(|(version, builds)| (version.clone(), builds.keys().cloned().collect()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub(crate) fn is_plist(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("plist"))
}
