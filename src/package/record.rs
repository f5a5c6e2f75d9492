//! Normalized view of one release

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::entry::{AssetEntry, RawRecord, RecordError};
use super::release_type::{ActualReleaseType, ReleaseType, is_prerelease_documentation};
use crate::build::identifier::is_prerequisite_shaped;
use crate::build::{
    BuildEntry, BuildMetadataLookup, OsVersion, SortKeyInput, actual_build, canonical_sort_key,
};
use crate::device::{OsFamily, record_family};

/// `1234-2016008004-`: timestamp padded with extra zeroes
static PADDED_URL_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}(\-|\.)20\d{8}\-").unwrap());
static URL_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}(\-|\.)20\d{6}(\-|.)").unwrap());

pub(crate) const UNKNOWN_DATE: &str = "00000000";

/// One release, with every derived attribute computed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    declared_build: String,
    actual_build: String,
    release_type: ReleaseType,
    actual_release_type: ActualReleaseType,
    documentation_id: String,
    os_version: String,
    marketing_version: String,
    compatibility_version: i64,
    prerequisite_build: Option<String>,
    prerequisite_version: String,
    suffix: Option<String>,
    beta_number: u32,
    url: String,
    download_size: u64,
    date: String,
    supported_devices: Vec<String>,
    supported_device_models: Vec<String>,
    allowable_ota: bool,
    auto_update: bool,
    sort_key: String,
}

impl PackageRecord {
    /// Builds a record from a static feed entry.
    pub fn from_feed(raw: RawRecord, lookup: &dyn BuildMetadataLookup) -> Result<Self, RecordError> {
        Self::from_entry(AssetEntry::from_raw(raw)?, lookup)
    }

    /// Builds a record from a query response; the response's posting date
    /// becomes the record's `Date`.
    pub fn from_query(
        mut raw: RawRecord,
        posting_date: &str,
        lookup: &dyn BuildMetadataLookup,
    ) -> Result<Self, RecordError> {
        raw.insert("Date".to_string(), Value::String(posting_date.to_string()));
        Self::from_feed(raw, lookup)
    }

    pub fn from_entry(
        entry: AssetEntry,
        lookup: &dyn BuildMetadataLookup,
    ) -> Result<Self, RecordError> {
        let url = entry.url().ok_or(RecordError::MissingField("download URL"))?;
        let download_size = entry
            .size()
            .ok_or(RecordError::MissingField("download size"))?;

        let declared_build = entry.build;
        let actual_build = actual_build(&declared_build);
        let documentation_id = entry
            .documentation_id
            .unwrap_or_else(|| "N/A".to_string());
        let models = entry.supported_device_models;
        let family = record_family(entry.asset_type.as_deref(), &entry.supported_devices);

        let metadata = family.and_then(|family| lookup.lookup(family, &actual_build));
        let overrides = metadata
            .as_ref()
            .map(|found| &found.entry)
            .filter(|found| found.visible_to(&models));

        let os_version = match &metadata {
            Some(found) => found.version.clone(),
            None => entry
                .os_version
                .strip_prefix("9.9.")
                .unwrap_or(&entry.os_version)
                .to_string(),
        };

        let mut marketing_version = match entry.marketing_version {
            Some(version) if !version.contains('.') => format!("{version}.0"),
            Some(version) => version,
            None => os_version.clone(),
        };
        if let Some(extra) = entry.product_version_extra.filter(|e| !e.is_empty()) {
            marketing_version.push(' ');
            marketing_version.push_str(&extra);
        }

        let prerequisite_build = entry
            .prerequisite_build
            .filter(|build| is_prerequisite_shaped(build));
        let prerequisite_version = prerequisite_label(
            family,
            prerequisite_build.as_deref(),
            entry.prerequisite_os_version,
            &models,
            lookup,
        );

        let suffix = overrides.and_then(|o| o.suffix.clone());
        let beta_number = overrides
            .and_then(|o| o.beta)
            .unwrap_or_else(|| documentation_beta_number(&documentation_id));
        let date = overrides
            .and_then(|o| o.date.clone())
            .or(entry.date)
            .unwrap_or_else(|| url_date(&url));

        let actual_release_type =
            ActualReleaseType::resolve(&entry.release_type, &documentation_id, &declared_build);
        let compatibility_version = entry.compatibility_version.unwrap_or(0);

        let sort_key = canonical_sort_key(&SortKeyInput {
            declared_build: &declared_build,
            is_honest: actual_build == declared_build,
            prerequisite_build: prerequisite_build.as_deref(),
            prerequisite_version: &prerequisite_version,
            release_type: &entry.release_type,
            compatibility_version,
        });

        Ok(Self {
            declared_build,
            actual_build,
            release_type: entry.release_type,
            actual_release_type,
            documentation_id,
            os_version,
            marketing_version,
            compatibility_version,
            prerequisite_build,
            prerequisite_version,
            suffix,
            beta_number,
            url,
            download_size,
            date,
            supported_devices: entry.supported_devices,
            supported_device_models: models,
            allowable_ota: entry.allowable_ota.unwrap_or(true),
            auto_update: entry.auto_update.unwrap_or(false),
            sort_key,
        })
    }

    pub fn declared_build(&self) -> &str {
        &self.declared_build
    }

    /// Build number without beta padding
    pub fn actual_build(&self) -> &str {
        &self.actual_build
    }

    /// False when the declared build was inflated
    pub fn is_honest_build(&self) -> bool {
        self.actual_build == self.declared_build
    }

    pub fn release_type(&self) -> &ReleaseType {
        &self.release_type
    }

    pub fn actual_release_type(&self) -> ActualReleaseType {
        self.actual_release_type
    }

    pub fn documentation_id(&self) -> &str {
        &self.documentation_id
    }

    pub fn os_version(&self) -> &str {
        &self.os_version
    }

    pub fn marketing_version(&self) -> &str {
        &self.marketing_version
    }

    /// Marketing version as a comparable version
    pub fn parsed_marketing_version(&self) -> Result<OsVersion, RecordError> {
        OsVersion::parse(&self.marketing_version).ok_or_else(|| RecordError::InvalidVersion {
            field: "MarketingVersion",
            value: self.marketing_version.clone(),
        })
    }

    pub fn parsed_os_version(&self) -> Result<OsVersion, RecordError> {
        OsVersion::parse(&self.os_version).ok_or_else(|| RecordError::InvalidVersion {
            field: "OSVersion",
            value: self.os_version.clone(),
        })
    }

    pub fn compatibility_version(&self) -> i64 {
        self.compatibility_version
    }

    /// The build this (delta) package applies to, if any
    pub fn prerequisite_build(&self) -> Option<&str> {
        self.prerequisite_build.as_deref()
    }

    /// Human readable prerequisite version, e.g. `12.0 beta 3`
    pub fn prerequisite_version(&self) -> &str {
        &self.prerequisite_version
    }

    /// `GM`, `RC`, ... from build metadata
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Beta ordinal; 0 for releases
    pub fn beta_number(&self) -> u32 {
        self.beta_number
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn download_size(&self) -> u64 {
        self.download_size
    }

    /// Size with thousands separators, e.g. `1,234,567`
    pub fn formatted_size(&self) -> String {
        group_thousands(self.download_size)
    }

    /// `YYYYMMDD`, `00000000` when unknown
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Year, month and day of [`Self::date`]
    pub fn date_parts(&self) -> (&str, &str, &str) {
        (
            self.date.get(..4).unwrap_or_default(),
            self.date.get(4..6).unwrap_or_default(),
            self.date.get(6..).unwrap_or_default(),
        )
    }

    pub fn supported_devices(&self) -> &[String] {
        &self.supported_devices
    }

    pub fn supported_device_models(&self) -> &[String] {
        &self.supported_device_models
    }

    pub fn supports_device(&self, device: &str) -> bool {
        self.supported_devices.iter().any(|d| d == device)
    }

    pub fn allowable_ota(&self) -> bool {
        self.allowable_ota
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Key defining the catalog order
    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }
}

fn prerequisite_label(
    family: Option<OsFamily>,
    prerequisite_build: Option<&str>,
    declared: Option<String>,
    models: &[String],
    lookup: &dyn BuildMetadataLookup,
) -> String {
    let from_metadata = family
        .zip(prerequisite_build)
        .and_then(|(family, build)| lookup.lookup(family, build))
        .filter(|found| !found.entry.is_empty() && found.entry.visible_to(models))
        .map(|found| describe(&found.version, &found.entry));

    from_metadata
        .or(declared)
        .unwrap_or_else(|| "0.0".to_string())
}

/// `<version>[ beta[ N]][ suffix]`
fn describe(version: &str, entry: &BuildEntry) -> String {
    let mut label = version.to_string();
    if let Some(beta) = entry.beta.filter(|b| *b >= 1) {
        label.push_str(" beta");
        if beta > 1 {
            label.push_str(&format!(" {beta}"));
        }
    }
    if let Some(suffix) = &entry.suffix {
        label.push_str(&format!(" {suffix}"));
    }
    label
}

/// Beta ordinal encoded at the end of a documentation id (`...Beta3`, `...Seed12`).
fn documentation_beta_number(documentation_id: &str) -> u32 {
    if !is_prerelease_documentation(documentation_id) {
        return 0;
    }

    let mut tail = documentation_id.chars().rev().map(|c| c.to_digit(10));
    match (tail.next().flatten(), tail.next().flatten()) {
        (Some(ones), Some(tens)) => tens * 10 + ones,
        (Some(ones), None) => ones,
        _ => 1,
    }
}

fn url_date(url: &str) -> String {
    if let Some(found) = PADDED_URL_DATE_RE.find(url) {
        let stamp = found.as_str();
        return format!("{}{}{}", &stamp[5..9], &stamp[10..12], &stamp[13..15]);
    }
    URL_DATE_RE
        .find(url)
        .map(|found| found.as_str()[5..13].to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::metadata::{BuildInfo, BuildMetadata, MockBuildMetadataLookup};
    use rstest::rstest;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn base() -> Value {
        json!({
            "Build": "16A366",
            "OSVersion": "12.0",
            "SupportedDevices": ["iPhone10,3"],
            "SupportedDeviceModels": ["D22AP"],
            "__BaseURL": "http://appldnld.apple.com/ios12/",
            "__RelativePath": "091-12345-20180917-ABCD/com_apple_MobileAsset_SoftwareUpdate/0123456789abcdef0123456789abcdef01234567.zip",
            "_DownloadSize": 2812345678u64
        })
    }

    fn with(overrides: Value) -> RawRecord {
        let mut record = raw(base());
        record.extend(raw(overrides));
        record
    }

    fn record(overrides: Value, lookup: &dyn BuildMetadataLookup) -> PackageRecord {
        PackageRecord::from_feed(with(overrides), lookup).unwrap()
    }

    fn empty() -> BuildInfo {
        BuildInfo::default()
    }

    #[test]
    fn derives_defaults_from_minimal_record() {
        let record = record(json!({}), &empty());

        assert_eq!(record.actual_build(), "16A366");
        assert!(record.is_honest_build());
        assert_eq!(record.release_type(), &ReleaseType::Public);
        assert_eq!(record.actual_release_type(), ActualReleaseType::Release);
        assert_eq!(record.marketing_version(), "12.0");
        assert_eq!(record.prerequisite_build(), None);
        assert_eq!(record.prerequisite_version(), "0.0");
        assert_eq!(record.beta_number(), 0);
        assert_eq!(record.date(), "20180917");
        assert_eq!(record.formatted_size(), "2,812,345,678");
        assert!(record.allowable_ota());
        assert!(!record.auto_update());
        assert_eq!(record.sort_key(), "16A0366$00.0$0000000000$0");
    }

    #[test]
    fn strips_nine_nine_prefix_from_os_version() {
        let record = record(json!({ "OSVersion": "9.9.12.0" }), &empty());
        assert_eq!(record.os_version(), "12.0");
    }

    #[rstest]
    #[case(json!({ "MarketingVersion": "12" }), "12.0")]
    #[case(json!({ "MarketingVersion": "12.0.1" }), "12.0.1")]
    #[case(json!({ "ProductVersionExtra": "(a)" }), "12.0 (a)")]
    fn marketing_version_returns_expected(#[case] overrides: Value, #[case] expected: &str) {
        assert_eq!(record(overrides, &empty()).marketing_version(), expected);
    }

    #[rstest]
    #[case("iOS12DeveloperBeta3", 3)]
    #[case("iOS12DeveloperBeta12", 12)]
    #[case("iOS12PublicBeta", 1)]
    #[case("iOS12Long", 0)]
    fn beta_number_from_documentation_id(#[case] documentation_id: &str, #[case] expected: u32) {
        let record = record(json!({ "SUDocumentationID": documentation_id }), &empty());
        assert_eq!(record.beta_number(), expected);
    }

    #[rstest]
    #[case("http://a/091-12345-2016008004-ABCD/x.zip", "20160804")]
    #[case("http://a/031-21276-20150906-9C53/x.zip", "20150906")]
    #[case("http://a/nodate/x.zip", "00000000")]
    fn url_date_returns_expected(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(url_date(url), expected);
    }

    #[test]
    fn explicit_date_wins_over_url() {
        let record = PackageRecord::from_query(raw(base()), "20190101", &empty()).unwrap();
        assert_eq!(record.date(), "20190101");
        assert_eq!(record.date_parts(), ("2019", "01", "01"));
    }

    #[test]
    fn metadata_overrides_apply_to_matching_models() {
        let info = BuildInfo::from_json(
            r#"{ "iOS": {
                "12.0": { "16A366": { "Suffix": "GM", "Beta": 2, "Date": "20180912", "Models": ["D22AP"] } },
                "11.4.1": { "15G77": { "Suffix": "RC" } }
            } }"#,
        )
        .unwrap();

        let record = record(json!({ "PrerequisiteBuild": "15G77" }), &info);
        assert_eq!(record.suffix(), Some("GM"));
        assert_eq!(record.beta_number(), 2);
        assert_eq!(record.date(), "20180912");
        assert_eq!(record.prerequisite_version(), "11.4.1 RC");
    }

    #[test]
    fn metadata_overrides_ignored_for_other_models() {
        let info = BuildInfo::from_json(
            r#"{ "iOS": { "12.0.1": { "16A366": { "Suffix": "GM", "Models": ["N71AP"] } } } }"#,
        )
        .unwrap();

        let record = record(json!({}), &info);
        assert_eq!(record.os_version(), "12.0.1");
        assert_eq!(record.suffix(), None);
    }

    #[test]
    fn prerequisite_label_includes_beta_ordinal() {
        let mut lookup = MockBuildMetadataLookup::new();
        lookup.expect_lookup().returning(|family, build| {
            (family == OsFamily::Ios && build == "16A5354b").then(|| BuildMetadata {
                version: "12.0".to_string(),
                entry: BuildEntry {
                    beta: Some(4),
                    ..Default::default()
                },
            })
        });

        let record = record(json!({ "PrerequisiteBuild": "16A5354b" }), &lookup);
        assert_eq!(record.prerequisite_version(), "12.0 beta 4");
    }

    #[test]
    fn prerequisite_label_falls_back_to_declared_version() {
        let record = record(
            json!({ "PrerequisiteBuild": "15G77", "PrerequisiteOSVersion": "11.4.1" }),
            &empty(),
        );
        assert_eq!(record.prerequisite_build(), Some("15G77"));
        assert_eq!(record.prerequisite_version(), "11.4.1");
    }

    #[test]
    fn malformed_prerequisite_build_is_ignored() {
        let record = record(json!({ "PrerequisiteBuild": "N/A" }), &empty());
        assert_eq!(record.prerequisite_build(), None);
    }

    #[test]
    fn inflated_build_is_dishonest() {
        let record = record(json!({ "Build": "12F5061", "OSVersion": "8.4" }), &empty());
        assert_eq!(record.actual_build(), "12F61");
        assert!(!record.is_honest_build());
        assert_eq!(record.actual_release_type(), ActualReleaseType::DeveloperBeta);
    }

    #[test]
    fn missing_url_is_reported() {
        let mut record = raw(base());
        record.remove("__BaseURL");
        let result = PackageRecord::from_feed(record, &empty());
        assert!(matches!(result, Err(RecordError::MissingField("download URL"))));
    }

    #[test]
    fn missing_size_is_reported() {
        let mut record = raw(base());
        record.remove("_DownloadSize");
        let result = PackageRecord::from_feed(record, &empty());
        assert!(matches!(result, Err(RecordError::MissingField("download size"))));
    }

    #[rstest]
    #[case(0, "0")]
    #[case(999, "999")]
    #[case(1000, "1,000")]
    #[case(123456789, "123,456,789")]
    fn group_thousands_returns_expected(#[case] value: u64, #[case] expected: &str) {
        assert_eq!(group_thousands(value), expected);
    }
}
