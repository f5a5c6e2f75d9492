//! Sort fragments and the canonical sort key
//!
//! Releases are ordered by a single string compared byte by byte. Each
//! fragment pads or rewrites its part of the key so that plain string
//! comparison gives the expected release order.

use std::sync::LazyLock;

use regex::Regex;

use super::identifier::{letter_end, strip_padding};
use crate::package::ReleaseType;

/// Separates the fragments of a sort key
pub const KEY_DELIMITER: char = '$';

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d?\d[A-Z]").unwrap());

/// Everything needed to build a record's sort key
#[derive(Debug, Clone)]
pub struct SortKeyInput<'a> {
    pub declared_build: &'a str,
    pub is_honest: bool,
    /// None when the record does not require a specific prior release
    pub prerequisite_build: Option<&'a str>,
    pub prerequisite_version: &'a str,
    pub release_type: &'a ReleaseType,
    pub compatibility_version: i64,
}

/// Build the composite sort key of a record.
pub fn canonical_sort_key(input: &SortKeyInput<'_>) -> String {
    let d = KEY_DELIMITER;
    format!(
        "{}{d}{}{d}{}{d}{}",
        sorting_build_fragment(input.declared_build, input.is_honest),
        prerequisite_version_fragment(input.prerequisite_version),
        sorting_prerequisite_fragment(
            input.prerequisite_build,
            input.release_type,
            input.prerequisite_version,
            input.declared_build,
        ),
        input.compatibility_version,
    )
}

/// Sort fragment of the declared build.
///
/// Single-digit majors get a leading zero (`9A550` -> `09A550`). Inflated
/// builds collapse to `<prefix>0000` so they come before their siblings.
pub fn sorting_build_fragment(declared_build: &str, is_honest: bool) -> String {
    let build = if second_char_is_letter(declared_build) {
        format!("0{declared_build}")
    } else {
        declared_build.to_string()
    };

    let split = letter_end(&build).unwrap_or(build.len());
    let (prefix, rest) = build.split_at(split);

    if !is_honest {
        return format!("{prefix}0000");
    }

    let (digits, letter) = match rest.chars().last() {
        Some(c) if c.is_alphabetic() => (&rest[..rest.len() - c.len_utf8()], Some(c)),
        _ => (rest, None),
    };

    let mut fragment = format!("{prefix}{digits:0>4}");
    if let Some(letter) = letter {
        fragment.push(letter);
    }
    fragment
}

/// Sort fragment of the prerequisite build.
///
/// Records without a prerequisite get a fixed rank per release type.
/// `prerequisite_label` is the human readable prerequisite version; when it
/// names a beta or RC the prerequisite build is un-padded first.
pub fn sorting_prerequisite_fragment(
    prerequisite_build: Option<&str>,
    release_type: &ReleaseType,
    prerequisite_label: &str,
    declared_build: &str,
) -> String {
    let Some(build) = prerequisite_build else {
        return match release_type {
            ReleaseType::Carrier => "0000000002",
            ReleaseType::Internal => "0000000003",
            _ => "0000000000",
        }
        .to_string();
    };

    // Pre-iOS 7 builds only need the major padded.
    if second_char_is_letter(build) {
        return format!("0{build}");
    }

    let Some(prefix) = PREFIX_RE.find(build).map(|m| m.as_str().to_string()) else {
        return build.to_string();
    };

    let mut build = if prerequisite_label.contains("beta") || prerequisite_label.contains("RC") {
        strip_padding(build, declared_build)
    } else {
        build.to_string()
    };

    while numeric_segment(&build).len() < 3 {
        build = format!("{prefix}0{}", after_letter(&build));
    }

    // Finals rank above same-numbered betas.
    if numeric_segment(&build).len() == 3 {
        build = format!("{prefix}6{}", after_letter(&build));
    }

    if build.chars().last().is_some_and(|c| c.is_ascii_digit()) {
        build.push('z');
    }

    build
}

/// Zero-padded major version of the prerequisite label, e.g. `9.3 beta 2` -> `09.3`.
pub fn prerequisite_version_fragment(prerequisite_label: &str) -> String {
    let major_len = prerequisite_label.split('.').next().map_or(0, str::len);
    let padded = if major_len < 2 {
        format!("0{prerequisite_label}")
    } else {
        prerequisite_label.to_string()
    };
    padded.split(' ').next().unwrap_or_default().to_string()
}

fn second_char_is_letter(build: &str) -> bool {
    build.chars().nth(1).is_some_and(char::is_alphabetic)
}

/// Text after the first uppercase letter, up to the next uppercase letter.
fn after_letter(build: &str) -> &str {
    build
        .split(|c: char| c.is_ascii_uppercase())
        .nth(1)
        .unwrap_or_default()
}

/// Digits between the first letter and the next letter of either case.
fn numeric_segment(build: &str) -> &str {
    build
        .split(|c: char| c.is_ascii_alphabetic())
        .nth(1)
        .unwrap_or_default()
}
