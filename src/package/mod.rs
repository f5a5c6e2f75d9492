//! Release records
//!
//! # Modules
//!
//! - [`entry`]: typed schema of a raw asset record
//! - [`release_type`]: declared and actual release types
//! - [`record`]: `PackageRecord`, the normalized and immutable release view

pub mod entry;
pub mod record;
pub mod release_type;

pub use entry::{AssetEntry, RawRecord, RecordError};
pub use record::PackageRecord;
pub use release_type::{ActualReleaseType, ReleaseType};
