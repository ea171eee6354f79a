//! Play-style storefront adapter
//!
//! Pulls paged review batches from the Play reviews endpoint. The stream is
//! newest-first and supports a per-rating `score` filter, which is what the
//! stratified paginator relies on. Continuation is an opaque token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ProviderAdapter, ProviderMetadata, PullRequest, ReviewPage};
use crate::error::{PipelineError, Result};
use crate::schemas::{RawReviewRecord, ReviewSource};

const PLAY_BASE_URL: &str = "https://play-reviews.googleapis.com/v1";

/// Play reviews response structures
#[derive(Debug, Deserialize)]
struct PlayReviewsResponse {
    status: String,
    reviews: Option<Vec<PlayReview>>,
    #[serde(rename = "nextToken")]
    next_token: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlayReview {
    #[serde(rename = "reviewId")]
    review_id: Option<String>,
    #[serde(rename = "userName")]
    user_name: Option<String>,
    score: Option<u8>,
    content: Option<String>,
    at: Option<DateTime<Utc>>,
    #[serde(rename = "thumbsUpCount")]
    thumbs_up_count: Option<u32>,
    #[serde(rename = "reviewCreatedVersion")]
    review_created_version: Option<String>,
    #[serde(rename = "replyContent")]
    reply_content: Option<String>,
    #[serde(rename = "repliedAt")]
    replied_at: Option<DateTime<Utc>>,
}

impl From<PlayReview> for RawReviewRecord {
    fn from(r: PlayReview) -> Self {
        RawReviewRecord {
            id: r.review_id,
            rating: r.score,
            text: r.content,
            timestamp: r.at,
            author: r.user_name,
            app_version: r.review_created_version,
            developer_reply: r.reply_content,
            reply_timestamp: r.replied_at,
            vote_count: r.thumbs_up_count,
        }
    }
}

/// Play storefront adapter
pub struct PlayMarketProvider {
    client: reqwest::Client,
    base_url: String,
    package: String,
    lang: String,
    country: String,
    metadata: ProviderMetadata,
}

impl PlayMarketProvider {
    pub fn new(client: reqwest::Client, package: &str, lang: &str, country: &str) -> Self {
        Self::with_base_url(client, PLAY_BASE_URL, package, lang, country)
    }

    /// Points the adapter at a different endpoint; used by tests
    pub fn with_base_url(
        client: reqwest::Client,
        base_url: &str,
        package: &str,
        lang: &str,
        country: &str,
    ) -> Self {
        let metadata = ProviderMetadata {
            source: ReviewSource::GooglePlay,
            name: "Google Play".to_string(),
            supports_rating_filter: true,
        };
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            package: package.to_string(),
            lang: lang.to_string(),
            country: country.to_string(),
            metadata,
        }
    }
}

#[async_trait]
impl ProviderAdapter for PlayMarketProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn pull(&self, request: PullRequest) -> Result<ReviewPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("package", self.package.clone()),
            ("lang", self.lang.clone()),
            ("country", self.country.clone()),
            ("sort", "newest".to_string()),
            ("count", request.page_size.to_string()),
        ];
        if let Some(score) = request.rating_filter {
            params.push(("score", score.to_string()));
        }
        if let Some(ref token) = request.cursor {
            params.push(("token", token.clone()));
        }

        let url = format!("{}/reviews", self.base_url);
        debug!(
            source = "google_play",
            score = ?request.rating_filter,
            cursor = request.cursor.is_some(),
            "Pulling review page"
        );

        let response = self.client.get(&url).query(&params).send().await?;
        let text = response.text().await?;
        let api_response: PlayReviewsResponse = serde_json::from_str(&text)?;

        if api_response.status != "ok" {
            return Err(PipelineError::Api {
                code: api_response.code.unwrap_or_else(|| "unknown".to_string()),
                message: api_response
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let items = api_response
            .reviews
            .unwrap_or_default()
            .into_iter()
            .map(RawReviewRecord::from)
            .collect();

        Ok(ReviewPage {
            items,
            next_cursor: api_response.next_token,
        })
    }
}
