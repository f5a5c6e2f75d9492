//! Rowspan accounting
//!
//! One pass over the sorted catalog counts how many rows share each cell
//! value. The wiki renderer then claims those counts in the same order: the
//! first row of a run emits `rowspan="N"`, later rows of the run emit nothing.

use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::package::PackageRecord;

/// Prerequisite key used for full (non-delta) packages
pub const NO_PREREQUISITE: &str = "N/A";

/// The universal iPod5,1 8.4.1 entry shares its file with the 10B141 delta
/// and must not merge with it.
fn skips_file_count(record: &PackageRecord) -> bool {
    record.supports_device("iPod5,1")
        && record.os_version() == "8.4.1"
        && record.prerequisite_build() == Some("10B141")
}

pub(crate) fn prerequisite_key(record: &PackageRecord) -> &str {
    record.prerequisite_build().unwrap_or(NO_PREREQUISITE)
}

/// Per-render repeat counts. Built fresh for every render and consumed by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowspanAccountant {
    builds: HashMap<String, usize>,
    dates: HashMap<String, usize>,
    files: HashMap<String, Vec<String>>,
    marketing_versions: HashMap<String, usize>,
    prerequisite_versions: HashMap<String, HashMap<String, usize>>,
    prerequisite_builds: HashMap<String, HashMap<String, usize>>,
}

impl RowspanAccountant {
    /// Counts every column over `catalog`, in catalog order.
    pub fn count(catalog: &Catalog) -> Self {
        let mut spans = Self::default();

        for record in catalog {
            *spans
                .builds
                .entry(record.declared_build().to_string())
                .or_default() += 1;

            // Dates follow the actual build: a GM and the next beta can be
            // posted on the same day.
            *spans
                .dates
                .entry(record.actual_build().to_string())
                .or_default() += 1;

            if !skips_file_count(record) {
                spans
                    .files
                    .entry(record.url().to_string())
                    .or_default()
                    .push(prerequisite_key(record).to_string());
            }

            *spans
                .marketing_versions
                .entry(record.marketing_version().to_string())
                .or_default() += 1;

            *spans
                .prerequisite_versions
                .entry(record.declared_build().to_string())
                .or_default()
                .entry(record.prerequisite_version().to_string())
                .or_default() += 1;

            *spans
                .prerequisite_builds
                .entry(record.declared_build().to_string())
                .or_default()
                .entry(prerequisite_key(record).to_string())
                .or_default() += 1;
        }

        spans
    }

    /// Takes the marketing version count; later rows see `None`.
    pub fn take_marketing_version(&mut self, marketing_version: &str) -> Option<usize> {
        self.marketing_versions.remove(marketing_version)
    }

    /// Drops a marketing version count without emitting it.
    pub fn forget_marketing_version(&mut self, marketing_version: &str) {
        self.marketing_versions.remove(marketing_version);
    }

    /// Takes the declared build count; later rows see `None`.
    pub fn take_build(&mut self, declared_build: &str) -> Option<usize> {
        self.builds.remove(declared_build)
    }

    /// Returns the count for a (declared build, prerequisite version) pair,
    /// consuming it when it spans several rows.
    pub fn claim_prerequisite_version(&mut self, declared_build: &str, label: &str) -> Option<usize> {
        claim_nested(&mut self.prerequisite_versions, declared_build, label)
    }

    /// Returns the count for a (declared build, prerequisite build) pair,
    /// consuming it when it spans several rows.
    pub fn claim_prerequisite_build(
        &mut self,
        declared_build: &str,
        prerequisite: &str,
    ) -> Option<usize> {
        claim_nested(&mut self.prerequisite_builds, declared_build, prerequisite)
    }

    /// Returns the date count of an actual build, consuming it when it spans
    /// several rows.
    pub fn claim_date(&mut self, actual_build: &str) -> Option<usize> {
        let count = *self.dates.get(actual_build)?;
        if count > 1 {
            self.dates.remove(actual_build);
        }
        Some(count)
    }

    /// True when `url` still has a pending row for `prerequisite`.
    pub fn has_file(&self, url: &str, prerequisite: &str) -> bool {
        self.files
            .get(url)
            .is_some_and(|prerequisites| prerequisites.iter().any(|p| p == prerequisite))
    }

    /// Rows still pending for `url`
    pub fn file_rows(&self, url: &str) -> usize {
        self.files.get(url).map_or(0, Vec::len)
    }

    /// Marks a file cell as emitted.
    ///
    /// A cell spanning rows leaves only `keep` pending rows, so the file can
    /// show up again further down the table. Otherwise the file is done.
    pub fn settle_file(&mut self, url: &str, span: isize, keep: usize) {
        if span > 0 {
            if let Some(prerequisites) = self.files.get_mut(url) {
                let excess = prerequisites.len().saturating_sub(keep);
                prerequisites.drain(..excess);
            }
        } else {
            self.files.remove(url);
        }
    }
}

fn claim_nested(
    counts: &mut HashMap<String, HashMap<String, usize>>,
    outer: &str,
    inner: &str,
) -> Option<usize> {
    let inner_counts = counts.get_mut(outer)?;
    let count = *inner_counts.get(inner)?;
    if count > 1 {
        inner_counts.remove(inner);
    }
    Some(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildInfo;
    use crate::package::RawRecord;
    use serde_json::json;

    fn record(build: &str, os_version: &str, prerequisite: Option<&str>, file: &str) -> PackageRecord {
        let mut raw: RawRecord = serde_json::from_value(json!({
            "Build": build,
            "OSVersion": os_version,
            "SupportedDevices": ["iPhone10,3"],
            "__BaseURL": "http://appldnld.apple.com/",
            "__RelativePath": file,
            "_DownloadSize": 1
        }))
        .unwrap();
        if let Some(prerequisite) = prerequisite {
            raw.insert("PrerequisiteBuild".to_string(), json!(prerequisite));
            raw.insert("PrerequisiteOSVersion".to_string(), json!("11.4"));
        }
        PackageRecord::from_feed(raw, &BuildInfo::default()).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            record("16A366", "12.0", None, "full.zip"),
            record("16A366", "12.0", Some("15F79"), "delta-a.zip"),
            record("16A366", "12.0", Some("15G77"), "delta-a.zip"),
            record("16A404", "12.0.1", None, "full.zip"),
        ])
    }

    #[test]
    fn count_tallies_every_column() {
        let mut spans = RowspanAccountant::count(&catalog());

        assert_eq!(spans.take_build("16A366"), Some(3));
        assert_eq!(spans.take_build("16A366"), None);
        assert_eq!(spans.take_marketing_version("12.0"), Some(3));
        assert_eq!(spans.claim_date("16A404"), Some(1));
        assert_eq!(spans.claim_prerequisite_version("16A366", "11.4"), Some(2));
        assert_eq!(spans.claim_prerequisite_build("16A366", NO_PREREQUISITE), Some(1));
        assert_eq!(spans.file_rows("http://appldnld.apple.com/full.zip"), 2);
        assert!(spans.has_file("http://appldnld.apple.com/delta-a.zip", "15G77"));
        assert!(!spans.has_file("http://appldnld.apple.com/delta-a.zip", NO_PREREQUISITE));
    }

    #[test]
    fn claims_consume_only_multi_row_spans() {
        let mut spans = RowspanAccountant::count(&catalog());

        assert_eq!(spans.claim_date("16A366"), Some(3));
        assert_eq!(spans.claim_date("16A366"), None);
        assert_eq!(spans.claim_date("16A404"), Some(1));
        assert_eq!(spans.claim_date("16A404"), Some(1));
    }

    #[test]
    fn claimed_spans_cover_every_row() {
        let catalog = catalog();
        let mut spans = RowspanAccountant::count(&catalog);

        let (mut builds, mut dates, mut marketing, mut versions, mut prerequisites) = (0, 0, 0, 0, 0);
        for record in &catalog {
            let declared = record.declared_build();
            builds += spans.take_build(declared).unwrap_or(0);
            marketing += spans
                .take_marketing_version(record.marketing_version())
                .unwrap_or(0);
            dates += spans.claim_date(record.actual_build()).unwrap_or(0);
            versions += spans
                .claim_prerequisite_version(declared, record.prerequisite_version())
                .unwrap_or(0);
            prerequisites += spans
                .claim_prerequisite_build(declared, prerequisite_key(record))
                .unwrap_or(0);
        }

        for total in [builds, dates, marketing, versions, prerequisites] {
            assert_eq!(total, catalog.len());
        }
    }

    #[test]
    fn settle_file_keeps_requested_rows() {
        let mut spans = RowspanAccountant::count(&catalog());
        let url = "http://appldnld.apple.com/full.zip";

        spans.settle_file(url, 2, 1);
        assert_eq!(spans.file_rows(url), 1);

        spans.settle_file(url, 0, 0);
        assert_eq!(spans.file_rows(url), 0);
    }

    #[test]
    fn universal_ipod_entry_is_not_counted_as_file_row() {
        let mut raw: RawRecord = serde_json::from_value(json!({
            "Build": "12H321",
            "OSVersion": "8.4.1",
            "PrerequisiteBuild": "10B141",
            "SupportedDevices": ["iPod5,1"],
            "__BaseURL": "http://appldnld.apple.com/",
            "__RelativePath": "universal.zip",
            "_DownloadSize": 1
        }))
        .unwrap();
        raw.insert("PrerequisiteOSVersion".to_string(), json!("6.1"));
        let record = PackageRecord::from_feed(raw, &BuildInfo::default()).unwrap();

        let spans = RowspanAccountant::count(&Catalog::from_records(vec![record]));

        assert_eq!(spans.file_rows("http://appldnld.apple.com/universal.zip"), 0);
    }
}
