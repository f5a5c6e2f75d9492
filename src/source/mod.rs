//! Asset sources
//!
//! Releases come from one of two places: a static feed listing every asset at
//! once, or a paginated query service answering one (version, build,
//! audience) request at a time.
//!
//! # Modules
//!
//! - [`traits`]: `FeedSource` and `QuerySource` capabilities
//! - [`feed`]: in-memory, file and mesu feeds
//! - [`gdmf`]: HTTP query service client
//! - [`request`]: query request bodies
//! - [`plist`]: XML property list decoding

pub mod feed;
pub mod gdmf;
pub mod plist;
pub mod request;
pub mod traits;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use feed::{FileFeed, MesuFeed, StaticFeed, open_feed};
pub use gdmf::GdmfSource;
pub use request::{AssetRequest, RequestKind};
pub use traits::{FeedSource, QueryResponse, QuerySource};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid property list: {0}")]
    Plist(#[from] plist::PlistError),

    #[error("Failed to read feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported source URL: {0}")]
    UnsupportedUrl(String),
}

/// Parameters of a paginated ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginatedParams {
    /// Build the device is currently running
    pub start_build: String,
    /// Version the device is currently running
    pub start_version: String,
    pub requested_version: Option<String>,
    pub supervised: bool,
    pub rapid_security_response: bool,
}

/// Where releases come from
#[derive(Clone)]
pub enum AssetSource {
    Feed(Arc<dyn FeedSource>),
    Query {
        source: Arc<dyn QuerySource>,
        params: PaginatedParams,
    },
}

impl AssetSource {
    pub fn is_paginated(&self) -> bool {
        matches!(self, AssetSource::Query { .. })
    }
}

impl fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Feed(_) => f.write_str("AssetSource::Feed"),
            AssetSource::Query { params, .. } => f
                .debug_struct("AssetSource::Query")
                .field("params", params)
                .finish(),
        }
    }
}
