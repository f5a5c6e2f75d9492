//! Report orchestration
//!
//! A report run validates the request, ingests a catalog from the chosen
//! source and renders it.
//!
//! # Modules
//!
//! - [`validate`]: request checks performed before any fetch

pub mod validate;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

pub use validate::{ValidationError, validate};

use crate::build::{BuildInfo, BuildMetadataLookup, MetadataError};
use crate::catalog::{CatalogIngester, IngestError, Query};
use crate::config::AppConfig;
use crate::device::DeviceDirectory;
use crate::package::RecordError;
use crate::render::{ReportRenderer, TextRenderer, WikiOptions, WikiRenderer};
use crate::source::{AssetSource, SourceError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Wiki,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub format: ReportFormat,
    /// Wiki only: wrap rows in heading, header and closing rows
    pub full_table: bool,
}

pub struct Reporter {
    lookup: Arc<dyn BuildMetadataLookup>,
    directory: DeviceDirectory,
}

impl Reporter {
    pub fn new(lookup: Arc<dyn BuildMetadataLookup>, directory: DeviceDirectory) -> Self {
        Self { lookup, directory }
    }

    /// Loads build metadata and the device directory from the configured
    /// paths. A missing device directory only costs wiki headings.
    pub fn from_config(config: &AppConfig) -> Result<Self, ReportError> {
        let build_info = config.build_info_path();
        let lookup = BuildInfo::load(&build_info).inspect_err(|e| {
            warn!("Failed to load build metadata from {}: {}", build_info.display(), e);
        })?;

        let device_info = config.device_info_path();
        let directory = if device_info.exists() {
            DeviceDirectory::load(&device_info)?
        } else {
            warn!(
                "Device directory {} not found, wiki headings fall back to the device identifier",
                device_info.display()
            );
            DeviceDirectory::default()
        };

        Ok(Self::new(Arc::new(lookup), directory))
    }

    /// Runs one report. `source` of `None` is only meaningful for error
    /// reporting: static mode needs a feed.
    pub async fn run(
        &self,
        query: &Query,
        source: Option<&AssetSource>,
        options: ReportOptions,
    ) -> Result<String, ReportError> {
        validate(query, source)?;
        let source = source.ok_or(ValidationError::NoSourceProvided)?;

        let outcome = CatalogIngester::new(Arc::clone(&self.lookup))
            .ingest(query, source)
            .await?;
        info!(
            "Rendering {} records for {} as {:?}",
            outcome.catalog.len(),
            query.device,
            options.format
        );

        let output = match options.format {
            ReportFormat::Text => TextRenderer::new(&query.device).render(&outcome.catalog),
            ReportFormat::Wiki => WikiRenderer::new(
                query,
                &self.directory,
                WikiOptions {
                    full_table: options.full_table,
                    explains_stub: outcome.explains_stub,
                },
            )
            .render(&outcome.catalog),
        };
        Ok(output)
    }
}
