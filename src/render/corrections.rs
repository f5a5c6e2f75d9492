//! Historical file rowspan corrections
//!
//! Some files are reused in rows separated by other files (e.g. the iOS 9.2
//! full package on older iPhones). Their merged cell must be shortened by a
//! fixed amount so the later occurrences still get a cell of their own.

use crate::build::OsVersion;
use crate::package::PackageRecord;

use super::rowspan::prerequisite_key;

#[derive(Debug)]
enum OsMatch {
    Exactly(&'static str),
    AtLeast(&'static str),
}

#[derive(Debug)]
struct RowspanCorrection {
    /// Prerequisite build, `N/A` for full packages
    prerequisite: &'static str,
    /// Only applies to records without a beta ordinal
    final_only: bool,
    os: OsMatch,
    /// Queried devices the correction is limited to; empty means any
    devices: &'static [&'static str],
    reduce_by: usize,
}

#[rustfmt::skip]
static CORRECTIONS: &[RowspanCorrection] = &[
    RowspanCorrection { prerequisite: "N/A",    final_only: true,  os: OsMatch::Exactly("9.2"),   devices: &["iPhone4,1", "iPhone5,1", "iPhone5,2"], reduce_by: 4 },
    RowspanCorrection { prerequisite: "N/A",    final_only: true,  os: OsMatch::Exactly("9.2.1"), devices: &[], reduce_by: 2 },
    RowspanCorrection { prerequisite: "13A340", final_only: false, os: OsMatch::Exactly("9.2"),   devices: &[], reduce_by: 2 },
    RowspanCorrection { prerequisite: "13A344", final_only: false, os: OsMatch::Exactly("9.2.1"), devices: &[], reduce_by: 1 },
    // 10.3.3 reuses these deltas, separated by 10.3.3 beta 6 (and 10.3.2 on iPad6,11/12)
    RowspanCorrection { prerequisite: "14C92",  final_only: false, os: OsMatch::AtLeast("11.2"),  devices: &[], reduce_by: 1 },
    RowspanCorrection { prerequisite: "14E277", final_only: false, os: OsMatch::AtLeast("11.2"),  devices: &[], reduce_by: 1 },
];

impl RowspanCorrection {
    fn applies(&self, record: &PackageRecord, device: &str) -> bool {
        let os_matches = match self.os {
            OsMatch::Exactly(version) => record.os_version() == version,
            OsMatch::AtLeast(version) => OsVersion::parse(record.os_version())
                .zip(OsVersion::parse(version))
                .is_some_and(|(actual, floor)| actual >= floor),
        };

        prerequisite_key(record) == self.prerequisite
            && (!self.final_only || record.beta_number() == 0)
            && os_matches
            && (self.devices.is_empty() || self.devices.contains(&device))
    }
}

/// Rows to subtract from the file rowspan of `record` when rendering for `device`
pub fn rowspan_reduction(record: &PackageRecord, device: &str) -> usize {
    CORRECTIONS
        .iter()
        .find(|correction| correction.applies(record, device))
        .map_or(0, |correction| correction.reduce_by)
}
