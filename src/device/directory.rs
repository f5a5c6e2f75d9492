//! Device directory used for wiki headings
//!
//! Layout: `device class -> device name -> { Models, HeaderLevel }`.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::build::MetadataError;
use crate::build::metadata::is_plist;
use crate::source::plist;

fn default_header_level() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeviceEntry {
    #[serde(default)]
    models: IndexMap<String, serde_json::Value>,
    #[serde(default = "default_header_level")]
    header_level: usize,
}

/// Heading shown above a device's table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHeading {
    pub name: String,
    pub level: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DeviceDirectory {
    classes: IndexMap<String, IndexMap<String, DeviceEntry>>,
}

impl DeviceDirectory {
    pub fn from_value(value: serde_json::Value) -> Result<Self, MetadataError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = std::fs::read_to_string(path)?;
        if is_plist(path) {
            Self::from_value(plist::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Finds the device listing `model`. When several classes list it, the
    /// last class wins.
    pub fn heading_for(&self, model: &str) -> Option<DeviceHeading> {
        self.classes
            .values()
            .filter_map(|devices| {
                devices
                    .iter()
                    .find(|(_, entry)| entry.models.contains_key(model))
            })
            .last()
            .map(|(name, entry)| DeviceHeading {
                name: name.clone(),
                level: entry.header_level,
            })
    }
}
