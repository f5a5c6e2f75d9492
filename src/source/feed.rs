//! Static feeds
//!
//! A feed is a document (property list or JSON) whose `Assets` array lists
//! every release at once.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::traits::FeedSource;
use super::{SourceError, plist};
use crate::config::MESU_ASSET_PREFIX;
use crate::package::RawRecord;

/// Feed held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    assets: Vec<RawRecord>,
}

impl StaticFeed {
    pub fn new(assets: Vec<RawRecord>) -> Self {
        Self { assets }
    }

    /// Takes the `Assets` array out of a decoded feed document.
    pub fn from_document(document: Value) -> Result<Self, SourceError> {
        Ok(Self::new(extract_assets(document)?))
    }
}

#[async_trait::async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_assets(&self) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.assets.clone())
    }
}

/// Feed read from a local file
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl FeedSource for FileFeed {
    async fn fetch_assets(&self) -> Result<Vec<RawRecord>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        debug!("Read feed {}", self.path.display());
        extract_assets(parse_document(&content)?)
    }
}

/// Feed published on mesu.apple.com
pub struct MesuFeed {
    client: reqwest::Client,
    url: String,
}

impl MesuFeed {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("ota-catalog")
                .timeout(timeout)
                .build()?,
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl FeedSource for MesuFeed {
    async fn fetch_assets(&self) -> Result<Vec<RawRecord>, SourceError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Feed returned status {}: {}", status, self.url);
            return Err(SourceError::Status(status.as_u16()));
        }

        let content = response.text().await?;
        extract_assets(parse_document(&content)?)
    }
}

/// Opens the feed at `location`: a mesu URL, or a local path.
///
/// Any other URL is rejected before anything is fetched.
pub fn open_feed(location: &str, timeout: Duration) -> Result<Arc<dyn FeedSource>, SourceError> {
    if location.contains(MESU_ASSET_PREFIX) {
        Ok(Arc::new(MesuFeed::new(location, timeout)?))
    } else if location.contains("://") {
        Err(SourceError::UnsupportedUrl(location.to_string()))
    } else {
        Ok(Arc::new(FileFeed::new(location)))
    }
}

/// Decodes a feed document; anything starting with `<` is a property list.
fn parse_document(content: &str) -> Result<Value, SourceError> {
    if content.trim_start().starts_with('<') {
        Ok(plist::from_str(content)?)
    } else {
        serde_json::from_str(content).map_err(|e| {
            warn!("Failed to parse feed: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })
    }
}

fn extract_assets(document: Value) -> Result<Vec<RawRecord>, SourceError> {
    let Value::Object(mut root) = document else {
        return Err(SourceError::InvalidResponse(
            "feed root is not a dictionary".to_string(),
        ));
    };
    let Some(Value::Array(assets)) = root.remove("Assets") else {
        return Err(SourceError::InvalidResponse(
            "feed has no Assets array".to_string(),
        ));
    };

    assets
        .into_iter()
        .map(|asset| match asset {
            Value::Object(record) => Ok(record),
            other => Err(SourceError::InvalidResponse(format!(
                "asset is not a dictionary: {other}"
            ))),
        })
        .collect()
}
