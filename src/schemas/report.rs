//! Report schemas
//!
//! `SummaryReport` is the sole artifact the pipeline exposes downstream.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::review::SentimentCategory;

/// A qualitative theme with an estimated mention count.
///
/// Counts from the backend path are scaled to corpus magnitude; counts from
/// the deterministic path are exact phrase frequencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Theme {
    pub label: String,
    pub mentions: u64,
}

/// Qualitative artifacts derived from the annotated corpus
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightResult {
    pub themes: Vec<Theme>,
    pub keywords: Vec<(String, usize)>,
    pub quotes: Vec<String>,
    /// At most 3 entries
    pub actions: Vec<String>,
}

/// A low-rated or negative review surfaced in the report, PII-scrubbed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalReview {
    pub timestamp: DateTime<Utc>,
    pub rating: u8,
    pub text: String,
}

/// Final report assembled once per run, immutable thereafter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_reviews: usize,
    /// Mean star rating rounded to 2 decimals; 0 for an empty corpus
    pub average_rating: f64,
    pub sentiment_distribution: BTreeMap<SentimentCategory, usize>,
    pub top_keywords: Vec<(String, usize)>,
    pub top_themes: Vec<Theme>,
    /// Newest first, at most 5
    pub recent_critical_reviews: Vec<CriticalReview>,
    pub user_quotes: Vec<String>,
    pub action_ideas: Vec<String>,
}

impl SummaryReport {
    /// The fixed report returned for an empty corpus
    pub fn empty() -> Self {
        Self {
            total_reviews: 0,
            average_rating: 0.0,
            sentiment_distribution: BTreeMap::new(),
            top_keywords: Vec::new(),
            top_themes: Vec::new(),
            recent_critical_reviews: Vec::new(),
            user_quotes: Vec::new(),
            action_ideas: Vec::new(),
        }
    }
}
