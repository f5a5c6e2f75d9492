use crate::build::OsVersion;

/// What a report is about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Device identifier, e.g. `iPhone10,3`
    pub device: String,
    /// Board model, e.g. `D22AP`
    pub model: Option<String>,
    /// Inclusive lower bound on the marketing version
    pub minimum: Option<OsVersion>,
    /// Inclusive upper bound; also stops paginated ingestion
    pub maximum: Option<OsVersion>,
    pub show_beta: bool,
    /// Drop releases that cannot be installed over the air
    pub remove_stubs: bool,
}

impl Query {
    pub fn for_device(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Returns true if `version` lies within the bounds.
    pub fn admits(&self, version: &OsVersion) -> bool {
        self.minimum.as_ref().is_none_or(|min| version >= min)
            && self.maximum.as_ref().is_none_or(|max| version <= max)
    }

    /// Returns true if `version` is above the upper bound.
    pub fn exceeds_maximum(&self, version: &OsVersion) -> bool {
        self.maximum.as_ref().is_some_and(|max| version > max)
    }
}
