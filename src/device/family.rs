//! Declarative device family table

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

const SOFTWARE_UPDATE: &str = "com.apple.MobileAsset.SoftwareUpdate";
const MAC_SOFTWARE_UPDATE: &str = "com.apple.MobileAsset.MacSoftwareUpdate";
const MAC_SPLAT_SOFTWARE_UPDATE: &str = "com.apple.MobileAsset.MacSplatSoftwareUpdate";
const STUDIO_DISPLAY_UPDATE: &str = "com.apple.MobileAsset.DarwinAccessoryUpdate.A2525";

static LEGACY_APPLE_TV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AppleTV(2,1|3,1|3,2)").unwrap());
static WATCH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Watch\d,\d").unwrap());

/// Operating system a release belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    AudioOs,
    DisplayOs,
    TvOs,
    Ios,
    MacOs,
    VisionOs,
    WatchOs,
}

impl OsFamily {
    /// Name used in build metadata and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::AudioOs => "audioOS",
            OsFamily::DisplayOs => "displayOS",
            OsFamily::TvOs => "tvOS",
            OsFamily::Ios => "iOS",
            OsFamily::MacOs => "macOS",
            OsFamily::VisionOs => "visionOS",
            OsFamily::WatchOs => "watchOS",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body layout of a paginated asset request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    Mac,
    Mobile,
}

/// One row of the device family table
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceFamily {
    pub prefix: &'static str,
    pub os: OsFamily,
    base_asset_type: &'static str,
    pub shape: RequestShape,
    /// Beta builds are requested with `ReleaseType: Beta`
    pub beta_release_type: bool,
    /// Rapid Security Responses can be queried
    pub allows_rsr: bool,
    /// Releases are published in a static feed
    pub static_feed: bool,
}

const fn row(
    prefix: &'static str,
    os: OsFamily,
    base_asset_type: &'static str,
    shape: RequestShape,
    beta_release_type: bool,
    allows_rsr: bool,
    static_feed: bool,
) -> DeviceFamily {
    DeviceFamily {
        prefix,
        os,
        base_asset_type,
        shape,
        beta_release_type,
        allows_rsr,
        static_feed,
    }
}

use OsFamily::*;
use RequestShape::{Mac, Mobile};

#[rustfmt::skip]
static FAMILIES: [DeviceFamily; 12] = [
    //   prefix            os         asset type             shape   beta   rsr    static
    row("AudioAccessory", AudioOs,   SOFTWARE_UPDATE,       Mobile, true,  false, true),
    row("AppleDisplay",   DisplayOs, STUDIO_DISPLAY_UPDATE, Mobile, false, false, false),
    row("AppleTV",        TvOs,      SOFTWARE_UPDATE,       Mobile, true,  false, true),
    row("iPad",           Ios,       SOFTWARE_UPDATE,       Mobile, true,  true,  true),
    row("iPhone",         Ios,       SOFTWARE_UPDATE,       Mobile, true,  true,  true),
    row("iPod",           Ios,       SOFTWARE_UPDATE,       Mobile, false, false, true),
    row("ADP",            MacOs,     MAC_SOFTWARE_UPDATE,   Mac,    false, false, false),
    row("iMac",           MacOs,     MAC_SOFTWARE_UPDATE,   Mac,    false, true,  false),
    row("Mac",            MacOs,     MAC_SOFTWARE_UPDATE,   Mac,    false, true,  false),
    row("VirtualMac",     MacOs,     MAC_SOFTWARE_UPDATE,   Mac,    false, true,  false),
    row("RealityDevice",  VisionOs,  SOFTWARE_UPDATE,       Mobile, true,  false, false),
    row("Watch",          WatchOs,   SOFTWARE_UPDATE,       Mobile, false, false, true),
];

impl DeviceFamily {
    /// Asset type to query; Rapid Security Responses use the "Splat" variant.
    pub fn asset_type(&self, rapid_security_response: bool) -> String {
        if rapid_security_response {
            self.base_asset_type.replace("Software", "SplatSoftware")
        } else {
            self.base_asset_type.to_string()
        }
    }

    /// Name of the OS as shown in text reports
    pub fn display_name(&self, device: &str) -> &'static str {
        if is_legacy_apple_tv(device) {
            "Apple TV software"
        } else {
            self.os.as_str()
        }
    }
}

/// Finds the family row for a device identifier such as `iPhone10,3`.
pub fn family_for_device(device: &str) -> Option<&'static DeviceFamily> {
    FAMILIES.iter().find(|family| device.starts_with(family.prefix))
}

/// OS family of a release: Mac asset types are macOS, everything else
/// follows the first supported device.
pub fn record_family(asset_type: Option<&str>, supported_devices: &[String]) -> Option<OsFamily> {
    if matches!(asset_type, Some(MAC_SOFTWARE_UPDATE | MAC_SPLAT_SOFTWARE_UPDATE)) {
        return Some(OsFamily::MacOs);
    }
    supported_devices
        .first()
        .and_then(|device| family_for_device(device))
        .map(|family| family.os)
}

/// 32-bit Apple TVs, which never published a marketing version
pub fn is_legacy_apple_tv(device: &str) -> bool {
    LEGACY_APPLE_TV_RE.is_match(device)
}

pub fn is_watch(device: &str) -> bool {
    WATCH_RE.is_match(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("iPhone10,3", Some(Ios))]
    #[case("iPod7,1", Some(Ios))]
    #[case("AppleTV5,3", Some(TvOs))]
    #[case("AppleDisplay1,1", Some(DisplayOs))]
    #[case("AudioAccessory1,1", Some(AudioOs))]
    #[case("MacBookPro18,1", Some(MacOs))]
    #[case("iMac21,1", Some(MacOs))]
    #[case("VirtualMac2,1", Some(MacOs))]
    #[case("ADP3,2", Some(MacOs))]
    #[case("RealityDevice14,1", Some(VisionOs))]
    #[case("Watch6,1", Some(WatchOs))]
    #[case("Toaster1,1", None)]
    fn family_for_device_returns_expected(#[case] device: &str, #[case] expected: Option<OsFamily>) {
        assert_eq!(family_for_device(device).map(|f| f.os), expected);
    }

    #[rstest]
    #[case("iPhone10,3", false, SOFTWARE_UPDATE)]
    #[case("iPhone10,3", true, "com.apple.MobileAsset.SplatSoftwareUpdate")]
    #[case("Mac14,2", false, MAC_SOFTWARE_UPDATE)]
    #[case("Mac14,2", true, MAC_SPLAT_SOFTWARE_UPDATE)]
    #[case("AppleDisplay1,1", false, STUDIO_DISPLAY_UPDATE)]
    fn asset_type_returns_expected(#[case] device: &str, #[case] rsr: bool, #[case] expected: &str) {
        assert_eq!(family_for_device(device).unwrap().asset_type(rsr), expected);
    }

    #[test]
    fn record_family_prefers_mac_asset_type() {
        let devices = vec!["iPhone10,3".to_string()];
        assert_eq!(record_family(Some(MAC_SOFTWARE_UPDATE), &devices), Some(MacOs));
        assert_eq!(record_family(Some(SOFTWARE_UPDATE), &devices), Some(Ios));
        assert_eq!(record_family(None, &[]), None);
    }

    #[rstest]
    #[case("AppleTV3,2", "Apple TV software")]
    #[case("AppleTV5,3", "tvOS")]
    #[case("iPad7,5", "iOS")]
    fn display_name_returns_expected(#[case] device: &str, #[case] expected: &str) {
        assert_eq!(family_for_device(device).unwrap().display_name(device), expected);
    }
}
