//! Storefront provider adapters
//!
//! Each storefront implements the `ProviderAdapter` trait: one page pull per
//! call, newest-first, with an opaque continuation cursor. The paginator
//! never sees provider wire formats, only `RawReviewRecord`s.

pub mod app_feed;
pub mod play_market;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schemas::{RawReviewRecord, ReviewSource};

/// Metadata about a provider adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub source: ReviewSource,
    /// Human-readable name
    pub name: String,
    /// Whether the provider can filter a pagination stream by star rating.
    /// Providers without this get a single unfiltered bucket.
    pub supports_rating_filter: bool,
}

/// One page pull
#[derive(Debug, Clone, Default)]
pub struct PullRequest {
    /// Continuation cursor from the previous page, if any
    pub cursor: Option<String>,
    /// Restrict the stream to a single star rating (1-5)
    pub rating_filter: Option<u8>,
    pub page_size: usize,
}

/// Result of one page pull
#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    pub items: Vec<RawReviewRecord>,
    /// Cursor for the next page; `None` means the provider is exhausted
    pub next_cursor: Option<String>,
}

/// Pull-page capability of a storefront
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn metadata(&self) -> &ProviderMetadata;

    /// Pulls one page of reviews, newest-first. Ordering within a page is
    /// not guaranteed to be strictly chronological.
    async fn pull(&self, request: PullRequest) -> Result<ReviewPage>;

    fn source(&self) -> ReviewSource {
        self.metadata().source
    }
}

pub use app_feed::AppFeedProvider;
pub use play_market::PlayMarketProvider;
