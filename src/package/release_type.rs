use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::build::is_beta_shaped;

static PRERELEASE_DOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(public|beta|seed)").unwrap());

/// Release type as declared by the record (`ReleaseType`, default `Public`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ReleaseType {
    #[default]
    Public,
    Beta,
    Darwin,
    Carrier,
    Internal,
    Unknown(String),
}

impl From<String> for ReleaseType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Public" => ReleaseType::Public,
            "Beta" => ReleaseType::Beta,
            "Darwin" => ReleaseType::Darwin,
            "Carrier" => ReleaseType::Carrier,
            "Internal" => ReleaseType::Internal,
            _ => ReleaseType::Unknown(value),
        }
    }
}

impl ReleaseType {
    pub fn as_str(&self) -> &str {
        match self {
            ReleaseType::Public => "Public",
            ReleaseType::Beta => "Beta",
            ReleaseType::Darwin => "Darwin",
            ReleaseType::Carrier => "Carrier",
            ReleaseType::Internal => "Internal",
            ReleaseType::Unknown(value) => value,
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a release really is, once documentation and build shape are considered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActualReleaseType {
    Unknown,
    Release,
    PublicBeta,
    DeveloperBeta,
    CarrierBeta,
    Internal,
}

impl ActualReleaseType {
    /// Resolves the actual release type of a record.
    ///
    /// Unknown declared types are logged and reported as `Unknown`.
    pub fn resolve(declared: &ReleaseType, documentation_id: &str, declared_build: &str) -> Self {
        match declared {
            ReleaseType::Public | ReleaseType::Beta | ReleaseType::Darwin => {
                if documentation_id.contains("Public") {
                    ActualReleaseType::PublicBeta
                } else if is_prerelease_documentation(documentation_id)
                    || is_beta_shaped(declared_build)
                {
                    ActualReleaseType::DeveloperBeta
                } else {
                    ActualReleaseType::Release
                }
            }
            ReleaseType::Carrier => ActualReleaseType::CarrierBeta,
            ReleaseType::Internal => ActualReleaseType::Internal,
            ReleaseType::Unknown(value) => {
                warn!("Unknown ReleaseType: {}", value);
                ActualReleaseType::Unknown
            }
        }
    }

    /// Numeric code: -1 unknown, 0 release, 1 public beta, 2 developer beta,
    /// 3 carrier beta, 4 internal
    pub fn code(&self) -> i8 {
        match self {
            ActualReleaseType::Unknown => -1,
            ActualReleaseType::Release => 0,
            ActualReleaseType::PublicBeta => 1,
            ActualReleaseType::DeveloperBeta => 2,
            ActualReleaseType::CarrierBeta => 3,
            ActualReleaseType::Internal => 4,
        }
    }

    /// Anything hidden unless betas are requested
    pub fn is_prerelease(&self) -> bool {
        self.code() > 0
    }
}

/// Documentation ids of prerelease builds (e.g. `iOS12DeveloperBeta3`)
pub(crate) fn is_prerelease_documentation(documentation_id: &str) -> bool {
    PRERELEASE_DOC_RE.is_match(&documentation_id.to_lowercase())
}
