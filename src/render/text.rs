//! Plain-text report

use super::ReportRenderer;
use crate::catalog::Catalog;
use crate::device::family_for_device;
use crate::package::{ActualReleaseType, PackageRecord};

/// One paragraph per release
#[derive(Debug, Clone)]
pub struct TextRenderer {
    device: String,
}

impl TextRenderer {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    fn os_name(&self) -> &'static str {
        family_for_device(&self.device).map_or("iOS", |family| family.display_name(&self.device))
    }

    fn paragraph(&self, record: &PackageRecord) -> String {
        let mut heading = format!("{} {}", self.os_name(), record.marketing_version());
        let label = match record.actual_release_type() {
            ActualReleaseType::PublicBeta => Some(" Public Beta"),
            ActualReleaseType::DeveloperBeta => Some(" beta"),
            ActualReleaseType::CarrierBeta => Some(" Carrier Beta"),
            ActualReleaseType::Internal => Some(" Internal"),
            ActualReleaseType::Release | ActualReleaseType::Unknown => None,
        };
        if let Some(label) = label {
            heading.push_str(label);
            if record.beta_number() > 1 {
                heading.push_str(&format!(" {}", record.beta_number()));
            }
        }

        let requires = match record.prerequisite_build() {
            Some(build) => format!("{} (Build {})", record.prerequisite_version(), build),
            None => "Not specified".to_string(),
        };
        let (year, month, day) = record.date_parts();

        [
            format!("{} (Build {})", heading, record.actual_build()),
            format!(
                "Listed as: {} (Build {})",
                record.os_version(),
                record.declared_build()
            ),
            format!("Installation permitted: {}", yes_no(record.allowable_ota())),
            format!("Auto-Update permitted: {}", yes_no(record.auto_update())),
            format!("Reported Release Type: {}", record.release_type()),
            format!("Requires: {requires}"),
            format!("Timestamp: {year}/{month}/{day}"),
            format!("URL: {}", record.url()),
            format!("File size: {}\n", record.formatted_size()),
        ]
        .join("\n")
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

impl ReportRenderer for TextRenderer {
    fn render(&self, catalog: &Catalog) -> String {
        catalog
            .iter()
            .map(|record| self.paragraph(record) + "\n")
            .collect()
    }
}
