//! Wiki table report
//!
//! Rows are written in catalog order. Each column claims its count from the
//! [`RowspanAccountant`]; the first row of a run opens a `rowspan` cell and
//! the rest of the run writes nothing for that column.

use std::sync::LazyLock;

use regex::Regex;

use super::ReportRenderer;
use super::corrections::rowspan_reduction;
use super::rowspan::{RowspanAccountant, prerequisite_key};
use crate::build::is_beta_shaped;
use crate::catalog::{Catalog, Query};
use crate::device::family::{is_legacy_apple_tv, is_watch};
use crate::device::{DeviceDirectory, DeviceHeading};
use crate::package::{ActualReleaseType, PackageRecord};

static FILE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9a-f]{40}\.zip").unwrap());

pub const STUB_BLURB: &str = "Users still running older versions of iOS (up to 9.3.5) are now presented with a [http://appldnld.apple.com/ios9/031-21276-20150906-9C5374F6-0D6F-4CEC-A322-668F61700CC9/com_apple_MobileAsset_OTARescueAsset/f393ae5156319e127a2b21d2f85b66a151c44ff5.zip dummy update file], and are instructed to use [[iTunes]] to install software updates.";

const TABLE_HEADER: &str = "{| class=\"wikitable\" style=\"font-size: smaller; text-align: center;\"
|-
! Version
! Build
! Prerequisite Version
! Prerequisite Build
! Release Date
! OTA Download URL
! File Size
";

const CELL: &str = "| ";
const DEFAULT_HEADER_LEVEL: usize = 3;

/// watchOS 1.0.x deltas whose marketing version would read 9.0
const WATCH_OS_1_PREREQUISITES: [&str; 2] = ["12S507", "12S632"];

/// iPod5,1 deltas from 6.1.x never merge their file cells
const BORKED_DELTA_DEVICE: &str = "iPod5,1";
const BORKED_DELTA_PREREQUISITE: &str = "10B141";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WikiOptions {
    /// Wrap the rows in a heading and table markup
    pub full_table: bool,
    /// Add the rescue stub paragraph under the heading
    pub explains_stub: bool,
}

#[derive(Debug, Clone)]
pub struct WikiRenderer {
    device: String,
    title: String,
    heading: DeviceHeading,
    options: WikiOptions,
}

impl WikiRenderer {
    /// Resolves the heading of the queried model (or device) in `directory`.
    pub fn new(query: &Query, directory: &DeviceDirectory, options: WikiOptions) -> Self {
        let title = query.model.clone().unwrap_or_else(|| query.device.clone());
        let heading = directory
            .heading_for(&title)
            .unwrap_or_else(|| DeviceHeading {
                name: query.device.clone(),
                level: DEFAULT_HEADER_LEVEL,
            });

        Self {
            device: query.device.clone(),
            title,
            heading,
            options,
        }
    }

    fn heading_line(&self) -> String {
        let marks = "=".repeat(self.heading.level);
        if self.heading.level == DEFAULT_HEADER_LEVEL {
            format!("{marks} [[{}]] {marks}\n", self.title)
        } else {
            format!("{marks} [[{}|{}]] {marks}\n", self.title, self.heading.name)
        }
    }

    fn row(&self, record: &PackageRecord, spans: &mut RowspanAccountant, out: &mut String) {
        // watchOS 2 builds call themselves 9.0
        let watch_plus_two = is_watch(&self.device) && record.actual_build().starts_with("13S");
        if watch_plus_two {
            spans.forget_marketing_version("9.0");
        }

        out.push_str("|-\n");
        self.marketing_cell(record, spans, watch_plus_two, out);

        let declared = record.declared_build();
        if let Some(count) = spans.take_build(declared) {
            out.push_str(CELL);
            out.push_str(&span_prefix(count));
            out.push_str(record.actual_build());
            if !record.is_honest_build() {
                out.push_str("<ref name=\"inflated\" />");
            }
            out.push('\n');
        }

        if let Some(count) = spans.claim_prerequisite_version(declared, record.prerequisite_version())
        {
            out.push_str(CELL);
            if count > 1 {
                out.push_str(&format!("rowspan=\"{count}\" "));
                if record.prerequisite_build().is_some() {
                    out.push_str(CELL);
                }
            }
            match record.prerequisite_build() {
                None => out.push_str("colspan=\"2\" {{n/a}}\n"),
                Some(build) => {
                    out.push_str(&prerequisite_label(record.prerequisite_version(), build));
                    out.push('\n');
                }
            }
        }

        if let Some(build) = record.prerequisite_build()
            && let Some(count) = spans.claim_prerequisite_build(declared, build)
        {
            out.push_str(CELL);
            out.push_str(&span_prefix(count));
            out.push_str(build);
            out.push('\n');
        }

        // Same actual build, same date, even across declared builds.
        if let Some(count) = spans.claim_date(record.actual_build()) {
            let (year, month, day) = record.date_parts();
            out.push_str(CELL);
            out.push_str(&span_prefix(count));
            out.push_str(&format!("{{{{date|{year}|{month}|{day}}}}}\n"));
        }

        self.file_cells(record, spans, out);
    }

    fn marketing_cell(
        &self,
        record: &PackageRecord,
        spans: &mut RowspanAccountant,
        watch_plus_two: bool,
        out: &mut String,
    ) {
        let marketing_version = record.marketing_version();
        let Some(count) = spans.take_marketing_version(marketing_version) else {
            return;
        };

        // 32-bit Apple TVs never published a marketing version.
        let legacy_apple_tv = is_legacy_apple_tv(&self.device);
        if count > 1 {
            if legacy_apple_tv {
                out.push_str(&format!("| rowspan=\"{count}\" | [MARKETING VERSION]\n"));
            }
            let span = if watch_plus_two { count + 2 } else { count };
            out.push_str(&format!("| rowspan=\"{span}\" "));
        } else if legacy_apple_tv {
            out.push_str("| [MARKETING VERSION]\n");
        }

        if !record
            .prerequisite_build()
            .is_some_and(|build| WATCH_OS_1_PREREQUISITES.contains(&build))
        {
            out.push_str(&format!("| {marketing_version}"));
        }

        if record.beta_number() > 0 {
            out.push_str(match record.actual_release_type() {
                ActualReleaseType::PublicBeta => " Public Beta",
                ActualReleaseType::DeveloperBeta | ActualReleaseType::CarrierBeta => " beta",
                ActualReleaseType::Internal => " Internal",
                ActualReleaseType::Release | ActualReleaseType::Unknown => "",
            });
            if record.beta_number() > 1 {
                out.push_str(&format!(" {}", record.beta_number()));
            }
        }

        if let Some(suffix) = record.suffix().filter(|suffix| !suffix.is_empty()) {
            out.push(' ');
            out.push_str(&suffix.replace("RC", "[[Release Candidate|RC]]"));
        }
        out.push('\n');

        // watchOS 1.0.x also lists the iOS-style version it reports
        if marketing_version.contains("1.0") && record.os_version().contains("8.2") {
            out.push_str(&format!(
                "| rowspan=\"{count}\" | {}\n",
                record.os_version()
            ));
        }
    }

    fn file_cells(&self, record: &PackageRecord, spans: &mut RowspanAccountant, out: &mut String) {
        let url = record.url();
        let borked = record.supports_device(BORKED_DELTA_DEVICE)
            && record.prerequisite_build() == Some(BORKED_DELTA_PREREQUISITE);

        if !(spans.has_file(url, prerequisite_key(record))
            || (borked && record.os_version() != "8.4.1"))
        {
            return;
        }

        let reduce = rowspan_reduction(record, &self.device);
        let span = spans.file_rows(url) as isize - reduce as isize;
        let prefix = if !borked && span > 1 {
            format!("rowspan=\"{span}\" | ")
        } else {
            String::new()
        };
        let file_name = FILE_NAME_RE.find(url).map_or("", |found| found.as_str());

        out.push_str(&format!("{CELL}{prefix}[{url} {file_name}]\n"));
        out.push_str(&format!("{CELL}{prefix}{}\n", record.formatted_size()));

        spans.settle_file(url, span, reduce);
    }
}

impl ReportRenderer for WikiRenderer {
    fn render(&self, catalog: &Catalog) -> String {
        let mut spans = RowspanAccountant::count(catalog);
        let mut out = String::new();

        if self.options.full_table {
            out.push_str(&self.heading_line());
            if self.options.explains_stub {
                out.push_str(STUB_BLURB);
                out.push_str("\n\n");
            }
            out.push_str(TABLE_HEADER);
        }

        for record in catalog {
            self.row(record, &mut spans, &mut out);
        }

        if self.options.full_table {
            out.push_str("|}");
        }
        out
    }
}

fn span_prefix(count: usize) -> String {
    if count > 1 {
        format!("rowspan=\"{count}\" | ")
    } else {
        String::new()
    }
}

/// Prerequisite version text, linking GM and RC and marking unlabeled betas.
fn prerequisite_label(label: &str, build: &str) -> String {
    if label.contains(" GM") {
        label.replace("GM", "[[Golden Master|GM]]")
    } else if label.contains(" RC") {
        label.replace("RC", "[[Release Candidate|RC]]")
    } else if is_beta_shaped(build) && !label.contains("beta") {
        format!("{label} beta #")
    } else {
        label.to_string()
    }
}
