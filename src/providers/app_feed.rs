//! App Store RSS feed adapter
//!
//! Pulls the customer-reviews RSS feed as JSON, one numbered page at a time,
//! newest-first. The feed offers no rating filter and caps out at page 10,
//! so this provider always runs as a single unfiltered bucket.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ProviderAdapter, ProviderMetadata, PullRequest, ReviewPage};
use crate::error::Result;
use crate::schemas::{RawReviewRecord, ReviewSource};

const APP_FEED_BASE_URL: &str = "https://itunes.apple.com";

/// The feed serves at most this many pages regardless of volume
const FEED_PAGE_LIMIT: u32 = 10;

/// RSS-JSON response structures. Every scalar arrives as `{"label": ...}`.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    feed: Feed,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    id: Option<Labeled>,
    author: Option<FeedAuthor>,
    #[serde(rename = "im:rating")]
    rating: Option<Labeled>,
    content: Option<Labeled>,
    updated: Option<Labeled>,
    #[serde(rename = "im:version")]
    version: Option<Labeled>,
    #[serde(rename = "im:voteCount")]
    vote_count: Option<Labeled>,
}

#[derive(Debug, Deserialize)]
struct FeedAuthor {
    name: Option<Labeled>,
}

#[derive(Debug, Deserialize)]
struct Labeled {
    label: String,
}

impl FeedEntry {
    /// The first entry of page 1 describes the app itself and has no
    /// rating; it maps to a record normalization will drop.
    fn into_record(self) -> RawReviewRecord {
        RawReviewRecord {
            id: self.id.map(|l| l.label),
            rating: self.rating.and_then(|l| l.label.parse().ok()),
            text: self.content.map(|l| l.label),
            timestamp: self
                .updated
                .and_then(|l| DateTime::parse_from_rfc3339(&l.label).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            author: self.author.and_then(|a| a.name).map(|l| l.label),
            app_version: self.version.map(|l| l.label),
            developer_reply: None,
            reply_timestamp: None,
            vote_count: self.vote_count.and_then(|l| l.label.parse().ok()),
        }
    }
}

/// App Store storefront adapter
pub struct AppFeedProvider {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    country: String,
    metadata: ProviderMetadata,
}

impl AppFeedProvider {
    pub fn new(client: reqwest::Client, app_id: &str, country: &str) -> Self {
        Self::with_base_url(client, APP_FEED_BASE_URL, app_id, country)
    }

    /// Points the adapter at a different endpoint; used by tests
    pub fn with_base_url(
        client: reqwest::Client,
        base_url: &str,
        app_id: &str,
        country: &str,
    ) -> Self {
        let metadata = ProviderMetadata {
            source: ReviewSource::AppStore,
            name: "App Store".to_string(),
            supports_rating_filter: false,
        };
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            country: country.to_string(),
            metadata,
        }
    }
}

#[async_trait]
impl ProviderAdapter for AppFeedProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn pull(&self, request: PullRequest) -> Result<ReviewPage> {
        let page: u32 = request
            .cursor
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(1);

        let url = format!(
            "{}/{}/rss/customerreviews/page={}/id={}/sortby=mostrecent/json",
            self.base_url, self.country, page, self.app_id
        );
        debug!(source = "app_store", page, "Pulling review feed page");

        let response = self.client.get(&url).send().await?;
        let text = response.text().await?;
        let feed: FeedResponse = serde_json::from_str(&text)?;

        let items: Vec<RawReviewRecord> = feed
            .feed
            .entry
            .into_iter()
            .map(FeedEntry::into_record)
            .collect();

        // The feed has no explicit cursor; an empty page or the provider's
        // page limit terminates the stream.
        let next_cursor = if items.is_empty() || page >= FEED_PAGE_LIMIT {
            None
        } else {
            Some((page + 1).to_string())
        };

        Ok(ReviewPage { items, next_cursor })
    }
}
