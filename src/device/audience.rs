//! Asset audiences
//!
//! Each OS family has a release audience plus one beta audience per major
//! version. Beta audiences are only queried when the starting version is
//! old enough to be offered that beta.

use crate::build::OsVersion;

use super::OsFamily;
use super::OsFamily::*;

#[derive(Debug, PartialEq, Eq)]
pub struct AudienceRule {
    pub id: &'static str,
    pub os: OsFamily,
    /// Only queried when betas are requested
    pub beta: bool,
    /// Inclusive lower bound on the starting version
    pub from: Option<&'static str>,
    /// Exclusive upper bound on the starting version
    pub until: Option<&'static str>,
}

const fn release(os: OsFamily, id: &'static str) -> AudienceRule {
    AudienceRule {
        id,
        os,
        beta: false,
        from: None,
        until: None,
    }
}

const fn beta(
    os: OsFamily,
    id: &'static str,
    from: Option<&'static str>,
    until: &'static str,
) -> AudienceRule {
    AudienceRule {
        id,
        os,
        beta: true,
        from,
        until: Some(until),
    }
}

#[rustfmt::skip]
static AUDIENCES: &[AudienceRule] = &[
    release(AudioOs, "0322d49d-d558-4ddf-bdff-c0443d0e6fac"),
    beta(AudioOs, "b05ddb59-b26d-4c89-9d09-5fda15e99207", None, "15.0"), // 14
    beta(AudioOs, "58ff8d56-1d77-4473-ba88-ee1690475e40", None, "16.0"), // 15
    beta(AudioOs, "59377047-7b3f-45b9-8e99-294c0daf3c85", None, "17.0"), // 16
    beta(AudioOs, "17536d4c-1a9d-4169-bc62-920a3873f7a5", None, "18.0"), // 17

    release(DisplayOs, "02d8e57e-dd1c-4090-aa50-b4ed2aef0062"),

    release(TvOs, "356d9da0-eee4-4c6c-bbe5-99b60eadddf0"),
    beta(TvOs, "5b220c65-fe50-460b-bac5-b6774b2ff475", None, "13.0"), // 12
    beta(TvOs, "975af5cb-019b-42db-9543-20327280f1b2", None, "14.0"), // 13
    beta(TvOs, "65254ac3-f331-4c19-8559-cbe22f5bc1a6", None, "15.0"), // 14
    beta(TvOs, "4d0dcdf7-12f2-4ebf-9672-ac4a4459a8bc", None, "16.0"), // 15
    beta(TvOs, "d6bac98b-9e2a-4f87-9aba-22c898b25d84", None, "17.0"), // 16
    beta(TvOs, "61693fed-ab18-49f3-8983-7c3adf843913", None, "18.0"), // 17

    release(Ios, "01c1d682-6e8f-4908-b724-5501fe3f5e5c"),
    // security releases
    AudienceRule { id: "c724cb61-e974-42d3-a911-ffd4dce11eda", os: Ios, beta: false, from: None, until: Some("16.0") },
    beta(Ios, "b7580fda-59d3-43ae-9488-a81b825e3c73", None, "12.0"), // 11
    beta(Ios, "ef473147-b8e7-4004-988e-0ae20e2532ef", None, "13.0"), // 12
    beta(Ios, "d8ab8a45-ee39-4229-891e-9d3ca78a87ca", Some("12.3"), "14.0"), // 13
    beta(Ios, "dbbb0481-d521-4cdf-a2a4-5358affc224b", Some("13.5"), "15.0"), // 14
    beta(Ios, "ce48f60c-f590-4157-a96f-41179ca08278", Some("14.3"), "16.0"), // 15
    beta(Ios, "a6050bca-50d8-4e45-adc2-f7333396a42c", Some("15.1"), "17.0"), // 16
    beta(Ios, "9dcdaf87-801d-42f6-8ec6-307bd2ab9955", Some("15.1"), "18.0"), // 17

    release(MacOs, "60b55e25-a8ed-4f45-826c-c1495a4ccc65"),
    beta(MacOs, "ca60afc6-5954-46fd-8cb9-60dde6ac39fd", None, "12.0"), // 11
    beta(MacOs, "298e518d-b45e-4d36-94be-34a63d6777ec", None, "13.0"), // 12
    beta(MacOs, "683e9586-8a82-4e5f-b0e7-767541864b8b", None, "14.0"), // 13
    beta(MacOs, "77c3bd36-d384-44e8-b550-05122d7da438", None, "15.0"), // 14

    release(VisionOs, "c59ff9d1-5468-4f6c-9e54-f68d5eeab93b"),
    beta(VisionOs, "4d282764-95fe-4e0e-b7da-ea218fd1f75a", None, "2.0"), // 1

    release(WatchOs, "b82fcf9c-c284-41c9-8eb2-e69bf5a5269f"),
    beta(WatchOs, "e841259b-ad2e-4046-b80f-ca96bc2e17f3", None, "6.0"), // 5
    beta(WatchOs, "d08cfd47-4a4a-4825-91b5-3353dfff194f", None, "7.0"), // 6
    beta(WatchOs, "ff6df985-3cbe-4d54-ba5f-50d02428d2a3", None, "8.0"), // 7
    beta(WatchOs, "b407c130-d8af-42fc-ad7a-171efea5a3d0", None, "9.0"), // 8
    beta(WatchOs, "341f2a17-0024-46cd-968d-b4444ec3699f", None, "10.0"), // 9
    beta(WatchOs, "7ae7f3b9-886a-437f-9b22-e9f017431b0e", None, "11.0"), // 10
];

impl AudienceRule {
    fn admits(&self, current: &OsVersion) -> bool {
        let above = self
            .from
            .and_then(OsVersion::parse)
            .is_none_or(|from| *current >= from);
        let below = self
            .until
            .and_then(OsVersion::parse)
            .is_none_or(|until| *current < until);
        above && below
    }
}

/// Audiences to query for `os`, starting from version `current`, in table order.
pub fn select_audiences(
    os: OsFamily,
    current: &OsVersion,
    show_beta: bool,
) -> Vec<&'static AudienceRule> {
    AUDIENCES
        .iter()
        .filter(|rule| rule.os == os)
        .filter(|rule| show_beta || !rule.beta)
        .filter(|rule| rule.admits(current))
        .collect()
}
