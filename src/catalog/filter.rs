//! Keep/drop decision for static feed records

use std::sync::LazyLock;

use regex::Regex;

use super::Query;
use crate::package::{PackageRecord, RecordError};

/// Devices that were offered the `99Z999` rescue stub
static STUB_DEVICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"iPad[4-6]|iPhone[6-8]|iPod7,1").unwrap());

const STUB_BUILD: &str = "99Z999";

/// Outcome of evaluating one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub keep: bool,
    /// The record is the rescue stub, so the wiki header should explain it
    pub explains_stub: bool,
}

#[derive(Debug, Clone)]
pub struct PackageFilter {
    query: Query,
}

impl PackageFilter {
    pub fn new(query: Query) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Device membership, plus model membership when the record lists models
    pub fn matches_device(&self, record: &PackageRecord) -> bool {
        if !record.supports_device(&self.query.device) {
            return false;
        }

        let models = record.supported_device_models();
        models.is_empty()
            || self
                .query
                .model
                .as_ref()
                .is_some_and(|model| models.contains(model))
    }

    /// Decides whether `record` belongs in the catalog.
    ///
    /// The stub check runs even for records of other devices. Only records
    /// that match the device have their marketing version parsed, so only
    /// they can fail.
    pub fn evaluate(&self, record: &PackageRecord) -> Result<Evaluation, RecordError> {
        if !self.query.show_beta && record.actual_release_type().is_prerelease() {
            return Ok(Evaluation::default());
        }

        let matched = self.matches_device(record);
        let explains_stub = STUB_DEVICE_RE.is_match(&self.query.device)
            && !record.allowable_ota()
            && record.actual_build() == STUB_BUILD;

        if (self.query.remove_stubs && !record.allowable_ota()) || !matched {
            return Ok(Evaluation {
                keep: false,
                explains_stub,
            });
        }

        Ok(Evaluation {
            keep: self.query.admits(&record.parsed_marketing_version()?),
            explains_stub,
        })
    }
}
