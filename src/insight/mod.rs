//! Insight generation
//!
//! Themes, action ideas and representative quotes, each produced by a
//! two-stage chain: a generative backend when one is configured, and a
//! deterministic phrase-frequency fallback that cannot fail on non-empty
//! input. Every public operation is a total function: it returns a valid
//! (possibly generic) result for any input, including total backend
//! unavailability.

pub mod extract;
pub mod fallback;
pub mod prompts;

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::backend::GenerativeBackend;
use crate::config::Config;
use crate::error::Result;
use crate::pii;
use crate::schemas::{CanonicalReview, InsightResult, Theme};

/// Character budget per review text inside a prompt
const PROMPT_TEXT_BUDGET: usize = 200;

/// Returned when there are no negative reviews to act on
const DEFAULT_ACTIONS: [&str; 3] = [
    "Monitor for new feedback",
    "Engage with positive reviewers",
    "Maintain current performance",
];

/// Returned when negative reviews exist but yield no usable phrases
const GENERIC_NEGATIVE_ACTIONS: [&str; 3] = [
    "Review recent negative feedback for specific bugs",
    "Improve response time to critical reviews",
    "Check app stability",
];

#[derive(Debug, Clone)]
pub struct InsightOptions {
    pub theme_sample_cap: usize,
    pub action_sample_cap: usize,
    pub quote_sample_cap: usize,
    pub top_themes: usize,
    pub quote_count: usize,
}

impl From<&Config> for InsightOptions {
    fn from(config: &Config) -> Self {
        Self {
            theme_sample_cap: config.theme_sample_cap,
            action_sample_cap: config.action_sample_cap,
            quote_sample_cap: config.quote_sample_cap,
            top_themes: config.top_themes,
            quote_count: config.quote_count,
        }
    }
}

/// Theme record as decoded from a backend reply
#[derive(Debug, Deserialize)]
struct RawTheme {
    label: String,
    count: Option<u64>,
}

/// Scales a sample-relative count up to corpus magnitude, rounded to the
/// nearest integer.
pub(crate) fn scale_count(raw: u64, total: usize, sample: usize) -> u64 {
    if sample == 0 {
        return raw;
    }
    (raw as f64 * total as f64 / sample as f64).round() as u64
}

fn truncate_chars(text: &str, budget: usize) -> String {
    text.chars().take(budget).collect()
}

pub struct InsightGenerator {
    backend: Option<Arc<dyn GenerativeBackend>>,
    options: InsightOptions,
}

impl InsightGenerator {
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>, options: InsightOptions) -> Self {
        Self { backend, options }
    }

    fn sample<'a>(reviews: &[&'a CanonicalReview], cap: usize) -> Vec<&'a CanonicalReview> {
        let mut rng = rand::thread_rng();
        reviews.choose_multiple(&mut rng, cap).copied().collect()
    }

    fn reviews_payload(sample: &[&CanonicalReview]) -> String {
        let records: Vec<serde_json::Value> = sample
            .iter()
            .map(|r| {
                json!({
                    "rating": r.rating,
                    "text": truncate_chars(&r.text, PROMPT_TEXT_BUDGET),
                })
            })
            .collect();
        serde_json::to_string(&records).unwrap_or_else(|_| "[]".to_string())
    }

    /// Runs all three operations plus deterministic keyword extraction.
    ///
    /// Keywords never touch the backend: they are always phrase
    /// frequencies, independent of the theme logic.
    pub async fn derive(
        &self,
        corpus: &[CanonicalReview],
        top_keywords: usize,
    ) -> InsightResult {
        if corpus.is_empty() {
            return InsightResult::default();
        }
        let themes = self.extract_themes(corpus).await;
        let actions = self.generate_action_ideas(corpus).await;
        let quotes = self.select_quotes(corpus).await;
        let keywords =
            fallback::top_phrases(corpus.iter().map(|r| r.text.as_str()), top_keywords);
        InsightResult {
            themes,
            keywords,
            quotes,
            actions,
        }
    }

    /// Dominant themes with corpus-scaled mention counts
    pub async fn extract_themes(&self, corpus: &[CanonicalReview]) -> Vec<Theme> {
        if corpus.is_empty() {
            return Vec::new();
        }
        if let Some(backend) = &self.backend {
            match self.themes_via_backend(backend.as_ref(), corpus).await {
                Ok(themes) if !themes.is_empty() => return themes,
                Ok(_) => warn!("Backend produced no themes, using fallback"),
                Err(e) => warn!(error = %e, "Backend theme extraction failed, using fallback"),
            }
        }
        self.fallback_themes(corpus)
    }

    async fn themes_via_backend(
        &self,
        backend: &dyn GenerativeBackend,
        corpus: &[CanonicalReview],
    ) -> Result<Vec<Theme>> {
        let refs: Vec<&CanonicalReview> = corpus.iter().collect();
        let sample = Self::sample(&refs, self.options.theme_sample_cap);
        let sample_size = sample.len();

        let prompt = prompts::themes(&Self::reviews_payload(&sample), self.options.top_themes);
        let reply = backend.generate(&prompt).await?;
        let raw: Vec<RawTheme> = extract::first_json_as(&reply)?;

        let mut themes: Vec<Theme> = raw
            .into_iter()
            .filter(|t| !t.label.trim().is_empty())
            .map(|t| Theme {
                label: t.label.trim().to_string(),
                mentions: scale_count(t.count.unwrap_or(1), corpus.len(), sample_size),
            })
            .collect();
        themes.sort_by(|a, b| b.mentions.cmp(&a.mentions));
        themes.truncate(self.options.top_themes);

        debug!(themes = themes.len(), sample_size, "Backend themes extracted");
        Ok(themes)
    }

    fn fallback_themes(&self, corpus: &[CanonicalReview]) -> Vec<Theme> {
        fallback::top_phrases(
            corpus.iter().map(|r| r.text.as_str()),
            self.options.top_themes,
        )
        .into_iter()
        .map(|(label, count)| Theme {
            label,
            mentions: count as u64,
        })
        .collect()
    }

    /// Concrete follow-ups derived from the negative subset; at most 3.
    /// With no negative reviews the fixed maintenance list is returned and
    /// the backend is not invoked.
    pub async fn generate_action_ideas(&self, corpus: &[CanonicalReview]) -> Vec<String> {
        let negative: Vec<&CanonicalReview> =
            corpus.iter().filter(|r| r.is_negative()).collect();
        if negative.is_empty() {
            return DEFAULT_ACTIONS.iter().map(|s| s.to_string()).collect();
        }

        if let Some(backend) = &self.backend {
            match self.actions_via_backend(backend.as_ref(), &negative).await {
                Ok(actions) if !actions.is_empty() => return actions,
                Ok(_) => warn!("Backend produced no actions, using fallback"),
                Err(e) => warn!(error = %e, "Backend action generation failed, using fallback"),
            }
        }
        self.fallback_actions(&negative)
    }

    async fn actions_via_backend(
        &self,
        backend: &dyn GenerativeBackend,
        negative: &[&CanonicalReview],
    ) -> Result<Vec<String>> {
        let sample = Self::sample(negative, self.options.action_sample_cap);
        let prompt = prompts::action_ideas(&Self::reviews_payload(&sample), 3);
        let reply = backend.generate(&prompt).await?;
        let actions: Vec<String> = extract::first_json_as(&reply)?;
        Ok(actions
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .take(3)
            .collect())
    }

    fn fallback_actions(&self, negative: &[&CanonicalReview]) -> Vec<String> {
        let complaints = fallback::top_phrases(negative.iter().map(|r| r.text.as_str()), 3);
        if complaints.is_empty() {
            return GENERIC_NEGATIVE_ACTIONS.iter().map(|s| s.to_string()).collect();
        }
        complaints
            .into_iter()
            .map(|(phrase, _)| format!("Investigate issues related to '{phrase}'"))
            .collect()
    }

    /// Representative quotes, PII-scrubbed in both stages
    pub async fn select_quotes(&self, corpus: &[CanonicalReview]) -> Vec<String> {
        if corpus.is_empty() {
            return Vec::new();
        }
        if let Some(backend) = &self.backend {
            match self.quotes_via_backend(backend.as_ref(), corpus).await {
                Ok(quotes) if !quotes.is_empty() => return quotes,
                Ok(_) => warn!("Backend produced no quotes, using fallback"),
                Err(e) => warn!(error = %e, "Backend quote selection failed, using fallback"),
            }
        }
        self.fallback_quotes(corpus)
    }

    async fn quotes_via_backend(
        &self,
        backend: &dyn GenerativeBackend,
        corpus: &[CanonicalReview],
    ) -> Result<Vec<String>> {
        let refs: Vec<&CanonicalReview> = corpus.iter().collect();
        let sample = Self::sample(&refs, self.options.quote_sample_cap);
        let prompt = prompts::quotes(&Self::reviews_payload(&sample), self.options.quote_count);
        let reply = backend.generate(&prompt).await?;
        let quotes: Vec<String> = extract::first_json_as(&reply)?;
        Ok(quotes
            .into_iter()
            .map(|q| pii::scrub(q.trim()))
            .filter(|q| !q.is_empty())
            .take(self.options.quote_count)
            .collect())
    }

    /// Deterministic quote choice: most-voted first, then newest, then id
    fn fallback_quotes(&self, corpus: &[CanonicalReview]) -> Vec<String> {
        let mut candidates: Vec<&CanonicalReview> =
            corpus.iter().filter(|r| !r.text.trim().is_empty()).collect();
        candidates.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
                .then_with(|| a.id.cmp(&b.id))
        });
        candidates
            .into_iter()
            .take(self.options.quote_count)
            .map(|r| pii::scrub(&r.text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::schemas::{ReviewSource, SentimentCategory};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockBackend {
        reply: std::result::Result<String, ()>,
        calls: AtomicUsize,
    }

    impl MockBackend {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeBackend for MockBackend {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(PipelineError::Api {
                    code: "500".to_string(),
                    message: "backend down".to_string(),
                }),
            }
        }
    }

    fn options() -> InsightOptions {
        InsightOptions {
            theme_sample_cap: 100,
            action_sample_cap: 50,
            quote_sample_cap: 50,
            top_themes: 5,
            quote_count: 3,
        }
    }

    fn review(id: u32, text: &str, sentiment: SentimentCategory) -> CanonicalReview {
        CanonicalReview {
            id: format!("gp:{id}"),
            source: ReviewSource::GooglePlay,
            rating: 3,
            text: text.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap()
                + chrono::Duration::minutes(i64::from(id)),
            author: "user".to_string(),
            app_version: None,
            developer_reply: None,
            reply_timestamp: None,
            vote_count: id,
            sentiment: Some(sentiment),
            sentiment_score: 0.0,
        }
    }

    fn corpus_of(n: u32, text: &str) -> Vec<CanonicalReview> {
        (0..n)
            .map(|i| review(i, text, SentimentCategory::Neutral))
            .collect()
    }

    #[test]
    fn scaling_is_rounded_to_nearest() {
        assert_eq!(scale_count(5, 200, 20), 50);
        assert_eq!(scale_count(1, 3, 2), 2); // 1.5 rounds up
        assert_eq!(scale_count(7, 10, 10), 7);
    }

    #[tokio::test]
    async fn backend_themes_are_parsed_and_scaled() {
        // 200 reviews, sample cap 20 => factor 10
        let mut opts = options();
        opts.theme_sample_cap = 20;
        let backend = Arc::new(MockBackend::replying(
            "Sure! Here you go:\n```json\n[{\"label\": \"payment issues\", \"count\": 5}]\n```",
        ));
        let generator = InsightGenerator::new(Some(backend), opts);

        let corpus = corpus_of(200, "payment failed");
        let themes = generator.extract_themes(&corpus).await;
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].label, "payment issues");
        assert_eq!(themes[0].mentions, 50);
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_phrases() {
        let backend = Arc::new(MockBackend::failing());
        let generator = InsightGenerator::new(Some(backend.clone()), options());

        let corpus = corpus_of(4, "checkout button broken");
        let themes = generator.extract_themes(&corpus).await;
        assert_eq!(backend.calls(), 1);
        assert!(!themes.is_empty());
        // first-seen bigram wins the tie
        assert_eq!(themes[0].label, "checkout button");
    }

    #[tokio::test]
    async fn garbage_reply_falls_back() {
        let backend = Arc::new(MockBackend::replying("I could not find any themes, sorry."));
        let generator = InsightGenerator::new(Some(backend), options());

        let corpus = corpus_of(4, "delivery partner late");
        let themes = generator.extract_themes(&corpus).await;
        assert!(!themes.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_backend_uses_fallback_directly() {
        let generator = InsightGenerator::new(None, options());
        let corpus = corpus_of(3, "refund pending forever");
        let themes = generator.extract_themes(&corpus).await;
        assert_eq!(themes[0].label, "refund pending");
        assert_eq!(themes[0].mentions, 3);
    }

    #[tokio::test]
    async fn empty_corpus_yields_empty_results() {
        let generator = InsightGenerator::new(None, options());
        assert!(generator.extract_themes(&[]).await.is_empty());
        assert!(generator.select_quotes(&[]).await.is_empty());
        let insights = generator.derive(&[], 10).await;
        assert!(insights.themes.is_empty());
        assert!(insights.keywords.is_empty());
        assert!(insights.quotes.is_empty());
        assert!(insights.actions.is_empty());
    }

    #[tokio::test]
    async fn derive_bundles_deterministic_keywords() {
        let generator = InsightGenerator::new(None, options());
        let corpus = corpus_of(3, "refund pending forever");
        let insights = generator.derive(&corpus, 10).await;
        assert_eq!(insights.keywords[0], ("refund pending".to_string(), 3));
        assert!(!insights.themes.is_empty());
        assert!(!insights.quotes.is_empty());
        // neutral corpus: the fixed maintenance actions
        assert_eq!(insights.actions.len(), 3);
        assert_eq!(insights.actions[0], "Monitor for new feedback");
    }

    #[tokio::test]
    async fn no_negative_reviews_returns_fixed_defaults_without_backend_call() {
        let backend = Arc::new(MockBackend::replying("[\"should not be used\"]"));
        let generator = InsightGenerator::new(Some(backend.clone()), options());

        let corpus: Vec<CanonicalReview> = (0..5)
            .map(|i| review(i, "all fine", SentimentCategory::Positive))
            .collect();
        let actions = generator.generate_action_ideas(&corpus).await;
        assert_eq!(
            actions,
            vec![
                "Monitor for new feedback",
                "Engage with positive reviewers",
                "Maintain current performance",
            ]
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn fallback_actions_name_top_complaints() {
        let generator = InsightGenerator::new(None, options());
        let corpus: Vec<CanonicalReview> = (0..4)
            .map(|i| review(i, "payment failed again today", SentimentCategory::Negative))
            .collect();
        let actions = generator.generate_action_ideas(&corpus).await;
        assert!(actions[0].contains("payment failed"));
        assert!(actions.len() <= 3);
    }

    #[tokio::test]
    async fn backend_actions_are_capped_at_three() {
        let backend = Arc::new(MockBackend::replying(
            r#"["Fix checkout", "Improve latency", "Add retry", "Fourth idea"]"#,
        ));
        let generator = InsightGenerator::new(Some(backend), options());
        let corpus: Vec<CanonicalReview> = (0..2)
            .map(|i| review(i, "slow and broken", SentimentCategory::Negative))
            .collect();
        let actions = generator.generate_action_ideas(&corpus).await;
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], "Fix checkout");
    }

    #[tokio::test]
    async fn quotes_are_scrubbed_in_backend_stage() {
        let backend = Arc::new(MockBackend::replying(
            r#"["Great app, mail me at jane@example.com"]"#,
        ));
        let generator = InsightGenerator::new(Some(backend), options());
        let corpus = corpus_of(2, "whatever");
        let quotes = generator.select_quotes(&corpus).await;
        assert_eq!(quotes, vec!["Great app, mail me at [EMAIL]"]);
    }

    #[tokio::test]
    async fn fallback_quotes_prefer_votes_then_recency() {
        let generator = InsightGenerator::new(None, options());
        let mut corpus = vec![
            review(1, "low votes", SentimentCategory::Neutral),
            review(2, "mid votes, reach me on 9876543210", SentimentCategory::Neutral),
            review(3, "high votes", SentimentCategory::Neutral),
        ];
        corpus[0].vote_count = 1;
        corpus[1].vote_count = 5;
        corpus[2].vote_count = 9;

        let quotes = generator.select_quotes(&corpus).await;
        assert_eq!(quotes[0], "high votes");
        assert_eq!(quotes[1], "mid votes, reach me on [PHONE]");
        assert_eq!(quotes[2], "low votes");
    }
}
