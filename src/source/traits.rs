//! Capabilities implemented by asset sources

#[cfg(test)]
use mockall::automock;

use super::SourceError;
use super::request::AssetRequest;
use crate::package::RawRecord;

/// A source that lists every asset in one document
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches the `Assets` array of the feed
    async fn fetch_assets(&self) -> Result<Vec<RawRecord>, SourceError>;
}

/// Decoded answer to one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    /// `YYYY-MM-DD`, when the service reported one
    pub posting_date: Option<String>,
    pub assets: Vec<RawRecord>,
}

/// A source answering one asset request at a time
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait QuerySource: Send + Sync {
    /// Sends one request and decodes the response
    ///
    /// # Returns
    /// * `Ok(QueryResponse)` - Assets offered for the request, possibly none
    /// * `Err(SourceError)` - Transport or decoding failure
    async fn query(&self, request: &AssetRequest) -> Result<QueryResponse, SourceError>;
}
