use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use semver::Version;

/// Dotted-numeric OS version (`12`, `12.0`, `12.0.1`)
///
/// Missing components count as zero, so `12` == `12.0` == `12.0.0`.
/// Anything after the first space (e.g. the `(a)` of a security response)
/// is ignored for comparisons.
#[derive(Debug, Clone)]
pub struct OsVersion {
    raw: String,
    version: Version,
}

impl OsVersion {
    /// Parse a version string, returning None if it is not dotted-numeric.
    pub fn parse(value: &str) -> Option<Self> {
        let raw = value.trim();
        let numeric = raw.split(' ').next()?;
        let parts: Vec<&str> = numeric.split('.').collect();
        if parts.len() > 3
            || parts
                .iter()
                .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return None;
        }

        // semver rejects leading zeros, so go through integers.
        let mut numbers = parts.iter().map(|p| p.parse::<u64>());
        let major = numbers.next()?.ok()?;
        let minor = numbers.next().transpose().ok()?.unwrap_or(0);
        let patch = numbers.next().transpose().ok()?.unwrap_or(0);

        Some(Self {
            raw: raw.to_string(),
            version: Version::new(major, minor, patch),
        })
    }

    /// The string this version was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for OsVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for OsVersion {}

impl Hash for OsVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
    }
}

impl PartialOrd for OsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
