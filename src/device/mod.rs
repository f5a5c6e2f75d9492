//! Device knowledge
//!
//! Everything that depends on the shape of a device identifier lives in data
//! tables here, so supporting a new device family is a table change.
//!
//! # Modules
//!
//! - [`family`]: device prefix -> OS family, asset type and request shape
//! - [`audience`]: asset audiences queried per OS family and version
//! - [`directory`]: wiki headings (device name and level) per model

pub mod audience;
pub mod directory;
pub mod family;

pub use audience::{AudienceRule, select_audiences};
pub use directory::{DeviceDirectory, DeviceHeading};
pub use family::{DeviceFamily, OsFamily, RequestShape, family_for_device, record_family};
