//! Up-front checks on a report request
//!
//! Everything here runs before any record is fetched.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::build::OsVersion;
use crate::catalog::Query;
use crate::device::family_for_device;
use crate::source::{AssetSource, PaginatedParams};

static DEVICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(ADP|AppleDisplay|AppleTV|AudioAccessory|iMac(Pro)?|iPad|iPhone|iPod|Mac(mini|Pro)?|MacBook(Air|Pro)?|RealityDevice|VirtualMac|Watch)(\d)?\d,\d",
    )
    .unwrap()
});

/// Devices whose releases differ per board model
static MODEL_REQUIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(iPad6,1(1|2)|iPhone8,(1|2|4))").unwrap());

static MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[BDJKMNP]\d((\d)?){2}[A-Za-z]?AP").unwrap());

static START_BUILD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}[A-Z]\d{2}\d?\d?[a-z]?").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid device identifier: {0}")]
    InvalidDevice(String),

    #[error("A valid board model is required for {0}")]
    InvalidModel(String),

    #[error("Missing or malformed starting build: {0:?}")]
    MissingOrMalformedStartBuild(String),

    #[error("Invalid starting version: {0:?}")]
    InvalidStartVersion(String),

    #[error("{0} releases are only available from the query service")]
    SourceRequiresPaginatedMode(String),

    #[error("No asset feed was provided")]
    NoSourceProvided,

    #[error("Rapid Security Responses cannot be queried for {0}")]
    RapidSecurityResponseUnsupported(String),
}

/// Checks a report request, in a fixed order, before ingestion.
///
/// `source` of `None` means static mode without a feed.
pub fn validate(query: &Query, source: Option<&AssetSource>) -> Result<(), ValidationError> {
    let params = match source {
        Some(AssetSource::Query { params, .. }) => Some(params),
        _ => None,
    };
    let family = family_for_device(&query.device);

    if params.is_some_and(|params| params.rapid_security_response)
        && !family.is_some_and(|family| family.allows_rsr)
    {
        return Err(ValidationError::RapidSecurityResponseUnsupported(
            query.device.clone(),
        ));
    }

    let Some(family) = family.filter(|_| DEVICE_RE.is_match(&query.device)) else {
        return Err(ValidationError::InvalidDevice(query.device.clone()));
    };

    if params.is_none() && !family.static_feed {
        return Err(ValidationError::SourceRequiresPaginatedMode(
            query.device.clone(),
        ));
    }

    if MODEL_REQUIRED_RE.is_match(&query.device)
        && !query
            .model
            .as_deref()
            .is_some_and(|model| MODEL_RE.is_match(model))
    {
        return Err(ValidationError::InvalidModel(query.device.clone()));
    }

    match (params, source) {
        (Some(params), _) => validate_start(params),
        (None, None) => Err(ValidationError::NoSourceProvided),
        (None, Some(_)) => Ok(()),
    }
}

fn validate_start(params: &PaginatedParams) -> Result<(), ValidationError> {
    if !START_BUILD_RE.is_match(&params.start_build) {
        return Err(ValidationError::MissingOrMalformedStartBuild(
            params.start_build.clone(),
        ));
    }
    if OsVersion::parse(&params.start_version).is_none() {
        return Err(ValidationError::InvalidStartVersion(
            params.start_version.clone(),
        ));
    }
    Ok(())
}
