use std::time::Duration;

use async_trait::async_trait;
use kala_common::FetchDescriptor;
use tracing::debug;

use crate::backend::query::artwork_page_params;
use crate::backend::{BackendClient, BackendError};
use crate::models::Artwork;

/// One page of records in backend order.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    /// Number of records returned, before any deduplication
    pub count: usize,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

/// Why a page fetch failed. Cloneable so it can be published in snapshots.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<BackendError> for FetchError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Http(e)
                if e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.is_body()
                    || e.is_decode() =>
            {
                FetchError::Network(e.to_string())
            }
            other => FetchError::Backend(other.to_string()),
        }
    }
}

/// Source of gallery pages. One network round-trip per call.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, descriptor: &FetchDescriptor) -> Result<Page<Artwork>, FetchError>;
}

#[async_trait]
impl PageFetcher for BackendClient {
    async fn fetch_page(&self, descriptor: &FetchDescriptor) -> Result<Page<Artwork>, FetchError> {
        let records: Vec<Artwork> = self
            .select("artworks", &artwork_page_params(descriptor))
            .await?;
        debug!(
            "Fetched {} artworks for range {}..{}",
            records.len(),
            descriptor.start,
            descriptor.end
        );
        Ok(Page::new(records))
    }
}
