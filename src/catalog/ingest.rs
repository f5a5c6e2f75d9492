//! Catalog ingestion
//!
//! Static feeds are evaluated record by record on the blocking pool.
//! Paginated sources are walked version by version, querying every asset
//! audience for each build listed in the build metadata.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use super::{Catalog, PackageFilter, Query};
use crate::build::{BuildMetadataLookup, OsVersion};
use crate::device::{family_for_device, select_audiences};
use crate::package::record::UNKNOWN_DATE;
use crate::package::{PackageRecord, RawRecord, RecordError};
use crate::source::request::restore_version;
use crate::source::{
    AssetRequest, AssetSource, FeedSource, PaginatedParams, QuerySource, RequestKind, SourceError,
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Unknown device family: {0}")]
    UnknownDevice(String),

    #[error("Invalid starting version: {0}")]
    InvalidStartVersion(String),

    #[error("Record evaluation failed: {0}")]
    Task(#[from] JoinError),
}

/// Result of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub catalog: Catalog,
    /// A rescue stub was seen for the queried device
    pub explains_stub: bool,
}

/// Builds catalogs from asset sources
#[derive(Clone)]
pub struct CatalogIngester {
    lookup: Arc<dyn BuildMetadataLookup>,
}

impl CatalogIngester {
    pub fn new(lookup: Arc<dyn BuildMetadataLookup>) -> Self {
        Self { lookup }
    }

    pub async fn ingest(
        &self,
        query: &Query,
        source: &AssetSource,
    ) -> Result<IngestOutcome, IngestError> {
        match source {
            AssetSource::Feed(feed) => self.ingest_feed(query, feed.as_ref()).await,
            AssetSource::Query { source, params } => {
                self.ingest_paginated(query, source.as_ref(), params).await
            }
        }
    }

    /// Fetches every feed record and keeps those passing [`PackageFilter`].
    pub async fn ingest_feed(
        &self,
        query: &Query,
        feed: &dyn FeedSource,
    ) -> Result<IngestOutcome, IngestError> {
        let assets = feed.fetch_assets().await?;
        let total = assets.len();
        let filter = Arc::new(PackageFilter::new(query.clone()));

        let mut tasks = JoinSet::new();
        for (index, raw) in assets.into_iter().enumerate() {
            let lookup = Arc::clone(&self.lookup);
            let filter = Arc::clone(&filter);
            tasks.spawn_blocking(move || evaluate(index, raw, lookup.as_ref(), &filter));
        }

        let mut kept = Vec::new();
        let mut explains_stub = false;
        while let Some(joined) = tasks.join_next().await {
            let (index, record, stub) = joined??;
            explains_stub |= stub;
            if let Some(record) = record {
                kept.push((index, record));
            }
        }

        // Tasks finish in any order; restore feed order before sorting.
        kept.sort_by_key(|(index, _)| *index);
        info!(
            "Kept {} of {} feed records for {}",
            kept.len(),
            total,
            query.device
        );

        Ok(IngestOutcome {
            catalog: Catalog::from_records(kept.into_iter().map(|(_, record)| record).collect()),
            explains_stub,
        })
    }

    /// Queries every (version, build, audience) combination between the
    /// starting version and the query's maximum. Returned records go through
    /// the same [`PackageFilter`] as feed records.
    ///
    /// Any failed request aborts the whole run.
    pub async fn ingest_paginated(
        &self,
        query: &Query,
        source: &dyn QuerySource,
        params: &PaginatedParams,
    ) -> Result<IngestOutcome, IngestError> {
        let family = family_for_device(&query.device)
            .ok_or_else(|| IngestError::UnknownDevice(query.device.clone()))?;
        let start = OsVersion::parse(&params.start_version)
            .ok_or_else(|| IngestError::InvalidStartVersion(params.start_version.clone()))?;
        let audiences = select_audiences(family.os, &start, query.show_beta);
        let asset_type = family.asset_type(params.rapid_security_response);
        let restore = restore_version(&params.start_build).unwrap_or_default();
        let filter = PackageFilter::new(query.clone());

        info!(
            "Querying {} audiences for {} from {} ({})",
            audiences.len(),
            query.device,
            start,
            params.start_build
        );

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut duplicates = 0usize;
        let mut filtered = 0usize;

        for (label, builds) in self.lookup.releases(family.os) {
            let Some(version) = OsVersion::parse(&label) else {
                warn!("Skipping unparseable {} version: {}", family.os, label);
                continue;
            };
            if version < start {
                continue;
            }
            if query.exceeds_maximum(&version) {
                break;
            }

            for build in builds {
                let kind = RequestKind::for_build(family, &build, &restore);
                let requests: Vec<AssetRequest> = audiences
                    .iter()
                    .map(|audience| AssetRequest {
                        audience: audience.id.to_string(),
                        asset_type: asset_type.clone(),
                        build: build.clone(),
                        version: label.clone(),
                        device: query.device.clone(),
                        model: query.model.clone(),
                        requested_version: params.requested_version.clone(),
                        supervised: params.supervised,
                        kind: kind.clone(),
                    })
                    .collect();

                debug!("Querying {} ({}) on {} audiences", label, build, requests.len());
                let responses =
                    try_join_all(requests.iter().map(|request| source.query(request))).await?;

                for response in responses {
                    let posting_date = compact_date(response.posting_date.as_deref());
                    for raw in response.assets {
                        let record =
                            PackageRecord::from_query(raw, &posting_date, self.lookup.as_ref())?;
                        let os_version = record.parsed_os_version()?;
                        if os_version < start || query.exceeds_maximum(&os_version) {
                            continue;
                        }
                        if !filter.evaluate(&record)?.keep {
                            filtered += 1;
                            continue;
                        }

                        if seen.insert(record.sort_key().to_string()) {
                            records.push(record);
                        } else {
                            duplicates += 1;
                        }
                    }
                }
            }
        }

        info!(
            "Collected {} records for {} ({} filtered, {} duplicates suppressed)",
            records.len(),
            query.device,
            filtered,
            duplicates
        );

        Ok(IngestOutcome {
            catalog: Catalog::from_records(records),
            explains_stub: false,
        })
    }
}

type Evaluated = (usize, Option<PackageRecord>, bool);

fn evaluate(
    index: usize,
    raw: RawRecord,
    lookup: &dyn BuildMetadataLookup,
    filter: &PackageFilter,
) -> Result<Evaluated, RecordError> {
    let record = PackageRecord::from_feed(raw, lookup)?;
    let evaluation = filter.evaluate(&record)?;
    Ok((index, evaluation.keep.then_some(record), evaluation.explains_stub))
}

/// `2022-09-12` -> `20220912`; absent dates become `00000000`.
fn compact_date(posting_date: Option<&str>) -> String {
    match posting_date {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|parsed| parsed.format("%Y%m%d").to_string())
            .unwrap_or_else(|_| date.replace('-', "")),
        None => UNKNOWN_DATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildInfo;
    use crate::source::traits::{MockFeedSource, MockQuerySource};
    use crate::source::{QueryResponse, StaticFeed};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn raw(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    fn asset(build: &str, os_version: &str, prerequisite: Option<&str>) -> RawRecord {
        let mut record = raw(json!({
            "Build": build,
            "OSVersion": os_version,
            "SupportedDevices": ["iPhone10,3"],
            "__BaseURL": "http://updates.cdn-apple.com/",
            "__RelativePath": format!("{build}/0123456789abcdef0123456789abcdef01234567.zip"),
            "_DownloadSize": 1024
        }));
        if let Some(prerequisite) = prerequisite {
            record.insert("PrerequisiteBuild".to_string(), json!(prerequisite));
        }
        record
    }

    fn metadata() -> Arc<dyn BuildMetadataLookup> {
        Arc::new(
            BuildInfo::from_json(
                r#"{ "iOS": {
                    "11.4": { "15F79": {} },
                    "11.4.1": { "15G77": {} },
                    "12.0": { "16A366": {} },
                    "12.1": { "16B92": {} }
                } }"#,
            )
            .unwrap(),
        )
    }

    fn params() -> PaginatedParams {
        PaginatedParams {
            start_build: "15G77".to_string(),
            start_version: "11.4.1".to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(Some("2022-09-12"), "20220912")]
    #[case(Some("20220912"), "20220912")]
    #[case(None, "00000000")]
    fn compact_date_returns_expected(#[case] input: Option<&str>, #[case] expected: &str) {
        assert_eq!(compact_date(input), expected);
    }

    #[tokio::test]
    async fn feed_ingestion_filters_and_sorts() {
        let feed = StaticFeed::new(vec![
            asset("16B92", "12.1", None),
            asset("16A366", "12.0", Some("15G77")),
            asset("16A366", "12.0", None),
            raw(json!({
                "Build": "16A366",
                "OSVersion": "12.0",
                "SupportedDevices": ["iPad7,5"],
                "__BaseURL": "http://updates.cdn-apple.com/",
                "__RelativePath": "ipad.zip",
                "_DownloadSize": 1
            })),
        ]);
        let ingester = CatalogIngester::new(metadata());

        let outcome = ingester
            .ingest_feed(&Query::for_device("iPhone10,3"), &feed)
            .await
            .unwrap();

        let keys: Vec<(&str, Option<&str>)> = outcome
            .catalog
            .iter()
            .map(|r| (r.declared_build(), r.prerequisite_build()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("16A366", None),
                ("16A366", Some("15G77")),
                ("16B92", None)
            ]
        );
        assert!(!outcome.explains_stub);
    }

    #[tokio::test]
    async fn feed_ingestion_fails_on_malformed_record() {
        let mut feed = MockFeedSource::new();
        feed.expect_fetch_assets()
            .returning(|| Ok(vec![raw(json!({ "Build": "16A366" }))]));
        let ingester = CatalogIngester::new(metadata());

        let result = ingester
            .ingest_feed(&Query::for_device("iPhone10,3"), &feed)
            .await;

        assert!(matches!(result, Err(IngestError::Record(_))));
    }

    #[tokio::test]
    async fn feed_ingestion_propagates_source_errors() {
        let mut feed = MockFeedSource::new();
        feed.expect_fetch_assets()
            .returning(|| Err(SourceError::Status(503)));
        let ingester = CatalogIngester::new(metadata());

        let result = ingester
            .ingest_feed(&Query::for_device("iPhone10,3"), &feed)
            .await;

        assert!(matches!(
            result,
            Err(IngestError::Source(SourceError::Status(503)))
        ));
    }

    #[tokio::test]
    async fn paginated_ingestion_walks_versions_and_dedupes() {
        let mut source = MockQuerySource::new();
        // 11.4.1 and 12.0 are queried on the release and security audiences;
        // 11.4 is below the start and 12.1 above the maximum.
        source.expect_query().times(4).returning(|request| {
            let assets = match request.build.as_str() {
                "15G77" => vec![
                    asset("16A366", "12.0", Some("15G77")),
                    asset("16B92", "12.1", Some("15G77")),
                ],
                _ => vec![],
            };
            Ok(QueryResponse {
                posting_date: Some("2018-09-17".to_string()),
                assets,
            })
        });
        let query = Query {
            maximum: OsVersion::parse("12.0"),
            ..Query::for_device("iPhone10,3")
        };
        let ingester = CatalogIngester::new(metadata());

        let outcome = ingester
            .ingest_paginated(&query, &source, &params())
            .await
            .unwrap();

        assert_eq!(outcome.catalog.len(), 1);
        let record = &outcome.catalog.records()[0];
        assert_eq!(record.declared_build(), "16A366");
        assert_eq!(record.date(), "20180917");
    }

    #[tokio::test]
    async fn paginated_ingestion_applies_package_filter() {
        let mut source = MockQuerySource::new();
        source.expect_query().returning(|request| {
            let assets = match request.build.as_str() {
                "15G77" => {
                    let mut other_device = asset("16A366", "12.0", Some("15G77"));
                    other_device.insert("SupportedDevices".to_string(), json!(["iPad7,5"]));
                    vec![asset("16A5366a", "12.0", None), other_device]
                }
                _ => vec![],
            };
            Ok(QueryResponse {
                posting_date: None,
                assets,
            })
        });
        let query = Query {
            maximum: OsVersion::parse("12.0"),
            ..Query::for_device("iPhone10,3")
        };
        let ingester = CatalogIngester::new(metadata());

        let outcome = ingester
            .ingest_paginated(&query, &source, &params())
            .await
            .unwrap();

        assert!(outcome.catalog.is_empty());
    }

    #[tokio::test]
    async fn paginated_ingestion_sends_request_per_audience() {
        let mut source = MockQuerySource::new();
        source
            .expect_query()
            .withf(|request| {
                request.device == "iPhone10,3"
                    && request.version == "11.4.1"
                    && request.kind == RequestKind::Standard
            })
            .times(2)
            .returning(|_| Ok(QueryResponse::default()));
        let query = Query {
            maximum: OsVersion::parse("11.4.1"),
            ..Query::for_device("iPhone10,3")
        };
        let ingester = CatalogIngester::new(metadata());

        let outcome = ingester
            .ingest_paginated(&query, &source, &params())
            .await
            .unwrap();

        assert!(outcome.catalog.is_empty());
    }

    #[tokio::test]
    async fn paginated_ingestion_aborts_on_failed_request() {
        let mut source = MockQuerySource::new();
        source
            .expect_query()
            .returning(|_| Err(SourceError::Status(500)));
        let ingester = CatalogIngester::new(metadata());

        let result = ingester
            .ingest_paginated(&Query::for_device("iPhone10,3"), &source, &params())
            .await;

        assert!(matches!(
            result,
            Err(IngestError::Source(SourceError::Status(500)))
        ));
    }

    #[tokio::test]
    async fn paginated_ingestion_rejects_unknown_device() {
        let source = MockQuerySource::new();
        let ingester = CatalogIngester::new(metadata());

        let result = ingester
            .ingest_paginated(&Query::for_device("Toaster1,1"), &source, &params())
            .await;

        assert!(matches!(result, Err(IngestError::UnknownDevice(_))));
    }
}
