//! Review record schemas
//!
//! `RawReviewRecord` is the provider-shaped transient form produced by a
//! single page pull. `CanonicalReview` is the normalized, provider-agnostic
//! record that flows through merge, classification and reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which storefront a review came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSource {
    GooglePlay,
    AppStore,
}

impl ReviewSource {
    /// Short identifier used in log fields and id namespacing
    pub fn id(&self) -> &'static str {
        match self {
            ReviewSource::GooglePlay => "google_play",
            ReviewSource::AppStore => "app_store",
        }
    }
}

impl std::fmt::Display for ReviewSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Sentiment bucket assigned after classification
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SentimentCategory::Positive => "positive",
            SentimentCategory::Neutral => "neutral",
            SentimentCategory::Negative => "negative",
        };
        f.write_str(s)
    }
}

/// Loosely-typed review as returned by a provider adapter.
///
/// Every field is optional; normalization decides what is usable. Created
/// per page pull and discarded after merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReviewRecord {
    pub id: Option<String>,
    pub rating: Option<u8>,
    pub text: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
}

/// Normalized review record.
///
/// Invariants: `id` is unique across the merged corpus of a run; after the
/// windowing step `timestamp >= now - window_days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalReview {
    pub id: String,
    pub source: ReviewSource,
    /// 1-5 stars
    pub rating: u8,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_timestamp: Option<DateTime<Utc>>,
    pub vote_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentCategory>,
    /// Polarity in [-1, 1]
    pub sentiment_score: f64,
}

impl CanonicalReview {
    pub fn is_negative(&self) -> bool {
        self.sentiment == Some(SentimentCategory::Negative)
    }

    /// Critical means a low star rating or negative classified sentiment
    pub fn is_critical(&self) -> bool {
        self.rating <= 2 || self.is_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn review(rating: u8, sentiment: Option<SentimentCategory>) -> CanonicalReview {
        CanonicalReview {
            id: "gp:1".to_string(),
            source: ReviewSource::GooglePlay,
            rating,
            text: "ok".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap(),
            author: "user".to_string(),
            app_version: None,
            developer_reply: None,
            reply_timestamp: None,
            vote_count: 0,
            sentiment,
            sentiment_score: 0.0,
        }
    }

    #[test]
    fn critical_by_rating_or_sentiment() {
        assert!(review(1, None).is_critical());
        assert!(review(2, Some(SentimentCategory::Positive)).is_critical());
        assert!(review(5, Some(SentimentCategory::Negative)).is_critical());
        assert!(!review(4, Some(SentimentCategory::Neutral)).is_critical());
    }

    #[test]
    fn source_serializes_snake_case() {
        let json = serde_json::to_string(&ReviewSource::GooglePlay).unwrap();
        assert_eq!(json, "\"google_play\"");
        let json = serde_json::to_string(&ReviewSource::AppStore).unwrap();
        assert_eq!(json, "\"app_store\"");
    }
}
