//! Beta detection and padding removal for build numbers

use std::sync::LazyLock;

use regex::Regex;

/// Builds that (most likely) belong to a beta, e.g. `15B6092` or `14A5309d`
pub const BETA_PATTERN: &str = r"\d?\d[A-Z][4-6]\d{3}[a-z]?";

/// Shape a prerequisite build must have to be taken into account
pub const PREREQUISITE_PATTERN: &str = r"\d?\d[A-Z]\d(\d?){2}";

static BETA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(BETA_PATTERN).unwrap());
static PREREQUISITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PREREQUISITE_PATTERN).unwrap());

/// Returns true if the build number looks like a beta build
pub fn is_beta_shaped(build: &str) -> bool {
    BETA_RE.is_match(build)
}

/// Returns true if the value is usable as a prerequisite build
pub fn is_prerequisite_shaped(build: &str) -> bool {
    PREREQUISITE_RE.is_match(build)
}

/// Byte offset right after the first uppercase letter, searching from index 1.
pub(crate) fn letter_end(build: &str) -> Option<usize> {
    build
        .bytes()
        .skip(1)
        .position(|b| b.is_ascii_uppercase())
        .map(|i| i + 2)
}

/// Returns the actual build number of a declared build.
///
/// `10A550` stays `10A550`, `12F5061` becomes `12F61`.
pub fn actual_build(declared_build: &str) -> String {
    strip_padding(declared_build, declared_build)
}

/// Removes beta padding from `build`.
///
/// `declared_build` is the build of the package being inspected; the
/// "fake 6" correction only applies when it ends in a letter.
pub fn strip_padding(build: &str, declared_build: &str) -> String {
    if !is_beta_shaped(build) {
        return build.to_string();
    }

    let Some(split) = letter_end(build) else {
        return build.to_string();
    };
    let (prefix, rest) = build.split_at(split);

    let Some(first) = rest.bytes().next().filter(u8::is_ascii_digit) else {
        return build.to_string();
    };

    // Own branch, not a beta (e.g. 11.0.1 build 15A8391).
    if first == b'8' {
        return build.to_string();
    }

    let digits = &rest[1..];

    if rest.len() == 5 {
        // A 6 is used to target every beta at once; the real seed used a 5.
        let declared_ends_in_letter = declared_build
            .chars()
            .last()
            .is_some_and(char::is_alphabetic);
        if first == b'6' && declared_ends_in_letter {
            return format!("{prefix}5{digits}");
        }
        return build.to_string();
    }

    let digits = digits.strip_prefix('0').unwrap_or(digits);
    format!("{prefix}{digits}")
}
