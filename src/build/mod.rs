//! Build number layer
//!
//! Firmware builds are published as `<major><letter><digits>[suffix]`
//! (e.g. `16A366`, `14A5309d`). This module normalizes them and derives the
//! keys used to order releases.
//!
//! # Modules
//!
//! - [`identifier`]: beta-shape detection and padding removal
//! - [`sorting`]: sort fragments and the canonical sort key
//! - [`os_version`]: dotted-numeric OS version comparisons
//! - [`metadata`]: read-only build metadata lookup (`BuildInfo`)

pub mod identifier;
pub mod metadata;
pub mod os_version;
pub mod sorting;

pub use identifier::{actual_build, is_beta_shaped, strip_padding};
pub use metadata::{BuildEntry, BuildInfo, BuildMetadata, BuildMetadataLookup, MetadataError};
pub use os_version::OsVersion;
pub use sorting::{SortKeyInput, canonical_sort_key};
