//! Catalog construction
//!
//! Turns raw asset records into the ordered list of releases a report is
//! rendered from.
//!
//! # Modules
//!
//! - [`query`]: what the user asked for (device, model, version bounds)
//! - [`filter`]: per-record keep/drop decision
//! - [`ingest`]: static and paginated ingestion

pub mod filter;
pub mod ingest;
pub mod query;

use std::slice;

pub use filter::{Evaluation, PackageFilter};
pub use ingest::{CatalogIngester, IngestError, IngestOutcome};
pub use query::Query;

use crate::package::PackageRecord;

/// Releases in ascending sort-key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<PackageRecord>,
}

impl Catalog {
    /// Orders `records` by sort key. The sort is stable, so records sharing a
    /// key keep their relative order.
    pub fn from_records(mut records: Vec<PackageRecord>) -> Self {
        records.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        Self { records }
    }

    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, PackageRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a PackageRecord;
    type IntoIter = slice::Iter<'a, PackageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildInfo;
    use crate::package::RawRecord;
    use serde_json::json;

    fn record(build: &str, prerequisite: Option<&str>) -> PackageRecord {
        let mut value = json!({
            "Build": build,
            "OSVersion": "9.9.12.0",
            "SupportedDevices": ["iPhone10,3"],
            "__BaseURL": "http://appldnld.apple.com/",
            "__RelativePath": format!("{build}.zip"),
            "_DownloadSize": 1
        });
        if let Some(prerequisite) = prerequisite {
            value["PrerequisiteBuild"] = json!(prerequisite);
            value["PrerequisiteOSVersion"] = json!("11.4");
        }
        let raw: RawRecord = serde_json::from_value(value).unwrap();
        PackageRecord::from_feed(raw, &BuildInfo::default()).unwrap()
    }

    #[test]
    fn from_records_orders_by_sort_key() {
        let catalog = Catalog::from_records(vec![
            record("16A366", Some("15G77")),
            record("16A5366a", None),
            record("9A334", None),
            record("16A366", None),
        ]);

        let builds: Vec<(&str, Option<&str>)> = catalog
            .iter()
            .map(|r| (r.declared_build(), r.prerequisite_build()))
            .collect();
        assert_eq!(
            builds,
            vec![
                ("9A334", None),
                ("16A366", None),
                ("16A366", Some("15G77")),
                ("16A5366a", None),
            ]
        );
    }

    #[test]
    fn from_records_keeps_order_of_equal_keys() {
        let first = record("16A366", None);
        let mut second_raw: RawRecord = serde_json::from_value(json!({
            "Build": "16A366",
            "OSVersion": "12.0",
            "SupportedDevices": ["iPhone10,3"],
            "__BaseURL": "http://appldnld.apple.com/",
            "__RelativePath": "other.zip",
            "_DownloadSize": 2
        }))
        .unwrap();
        second_raw.insert("SUDocumentationID".to_string(), json!("iOS12Long"));
        let second = PackageRecord::from_feed(second_raw, &BuildInfo::default()).unwrap();
        assert_eq!(first.sort_key(), second.sort_key());

        let catalog = Catalog::from_records(vec![second.clone(), first.clone()]);
        assert_eq!(catalog.records(), &[second, first]);
    }
}
