//! Summary assembly
//!
//! Composes the final `SummaryReport` from the annotated corpus. Keywords
//! always come from the deterministic phrase-frequency method; themes,
//! actions and quotes are delegated to the insight generator.

use std::collections::BTreeMap;

use tracing::info;

use crate::insight::InsightGenerator;
use crate::pii;
use crate::schemas::{CanonicalReview, CriticalReview, SentimentCategory, SummaryReport};

/// Critical reviews surfaced per report
const CRITICAL_LIMIT: usize = 5;

pub struct SummaryAssembler<'a> {
    generator: &'a InsightGenerator,
    top_keywords: usize,
}

impl<'a> SummaryAssembler<'a> {
    pub fn new(generator: &'a InsightGenerator, top_keywords: usize) -> Self {
        Self {
            generator,
            top_keywords,
        }
    }

    /// Builds the report. An empty corpus short-circuits to the fixed empty
    /// report without invoking any sub-generator.
    pub async fn assemble(&self, corpus: &[CanonicalReview]) -> SummaryReport {
        if corpus.is_empty() {
            return SummaryReport::empty();
        }

        let total = corpus.len();
        let rating_sum: u32 = corpus.iter().map(|r| u32::from(r.rating)).sum();
        let average_rating = (f64::from(rating_sum) / total as f64 * 100.0).round() / 100.0;

        let mut sentiment_distribution: BTreeMap<SentimentCategory, usize> = BTreeMap::new();
        for review in corpus {
            let category = review.sentiment.unwrap_or(SentimentCategory::Neutral);
            *sentiment_distribution.entry(category).or_insert(0) += 1;
        }

        let insights = self.generator.derive(corpus, self.top_keywords).await;

        let mut critical: Vec<&CanonicalReview> =
            corpus.iter().filter(|r| r.is_critical()).collect();
        critical.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        let recent_critical_reviews: Vec<CriticalReview> = critical
            .into_iter()
            .take(CRITICAL_LIMIT)
            .map(|r| CriticalReview {
                timestamp: r.timestamp,
                rating: r.rating,
                text: pii::scrub(&r.text),
            })
            .collect();

        info!(
            total,
            average_rating,
            critical = recent_critical_reviews.len(),
            "Report assembled"
        );

        SummaryReport {
            total_reviews: total,
            average_rating,
            sentiment_distribution,
            top_keywords: insights.keywords,
            top_themes: insights.themes,
            recent_critical_reviews,
            user_quotes: insights.quotes,
            action_ideas: insights.actions,
        }
    }
}

/// Renders the report as the plain-text block printed by the CLI
pub fn render_text(report: &SummaryReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "=".repeat(50)));
    out.push_str("REVIEW SUMMARY REPORT\n");
    out.push_str(&format!("{}\n", "=".repeat(50)));
    out.push_str(&format!("Total Reviews: {}\n", report.total_reviews));
    out.push_str(&format!("Average Rating: {}\n", report.average_rating));

    out.push_str("\nSentiment Distribution:\n");
    for (category, count) in &report.sentiment_distribution {
        out.push_str(&format!("  {category}: {count}\n"));
    }

    out.push_str("\nTop Keywords:\n");
    for (keyword, count) in &report.top_keywords {
        out.push_str(&format!("  {keyword}: {count}\n"));
    }

    out.push_str("\nTop Themes:\n");
    for theme in &report.top_themes {
        out.push_str(&format!("  {}: {} mentions\n", theme.label, theme.mentions));
    }

    out.push_str("\nRecent Critical Reviews:\n");
    for review in &report.recent_critical_reviews {
        let preview: String = review.text.chars().take(100).collect();
        out.push_str(&format!(
            "  - [{}*] {}: {}\n",
            review.rating,
            review.timestamp.format("%Y-%m-%d %H:%M"),
            preview
        ));
    }

    out.push_str("\nUser Quotes:\n");
    for quote in &report.user_quotes {
        out.push_str(&format!("  \"{quote}\"\n"));
    }

    out.push_str("\nAction Ideas:\n");
    for action in &report.action_ideas {
        out.push_str(&format!("  - {action}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::InsightOptions;
    use crate::schemas::ReviewSource;
    use chrono::{TimeZone, Utc};

    fn options() -> InsightOptions {
        InsightOptions {
            theme_sample_cap: 100,
            action_sample_cap: 50,
            quote_sample_cap: 50,
            top_themes: 5,
            quote_count: 3,
        }
    }

    fn review(
        id: u32,
        rating: u8,
        sentiment: SentimentCategory,
        text: &str,
    ) -> CanonicalReview {
        CanonicalReview {
            id: format!("gp:{id}"),
            source: ReviewSource::GooglePlay,
            rating,
            text: text.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::hours(i64::from(id)),
            author: "user".to_string(),
            app_version: None,
            developer_reply: None,
            reply_timestamp: None,
            vote_count: 0,
            sentiment: Some(sentiment),
            sentiment_score: 0.0,
        }
    }

    #[tokio::test]
    async fn empty_corpus_returns_fixed_empty_report() {
        let generator = InsightGenerator::new(None, options());
        let assembler = SummaryAssembler::new(&generator, 10);
        let report = assembler.assemble(&[]).await;

        assert_eq!(report.total_reviews, 0);
        assert_eq!(report.average_rating, 0.0);
        assert!(report.sentiment_distribution.is_empty());
        assert!(report.top_keywords.is_empty());
        assert!(report.top_themes.is_empty());
        assert!(report.recent_critical_reviews.is_empty());
        assert!(report.user_quotes.is_empty());
        assert!(report.action_ideas.is_empty());
    }

    #[tokio::test]
    async fn ten_review_scenario_distribution_and_average() {
        use SentimentCategory::{Negative as Neg, Neutral as Neu, Positive as Pos};
        let ratings = [5u8, 4, 3, 2, 1, 5, 4, 3, 2, 1];
        let sentiments = [Pos, Pos, Neu, Neg, Neg, Pos, Pos, Neu, Neg, Neg];

        let corpus: Vec<CanonicalReview> = ratings
            .iter()
            .zip(sentiments.iter())
            .enumerate()
            .map(|(i, (r, s))| review(i as u32, *r, *s, "fine app overall"))
            .collect();

        let generator = InsightGenerator::new(None, options());
        let assembler = SummaryAssembler::new(&generator, 10);
        let report = assembler.assemble(&corpus).await;

        assert_eq!(report.total_reviews, 10);
        assert_eq!(report.average_rating, 3.0);
        assert_eq!(report.sentiment_distribution[&Pos], 4);
        assert_eq!(report.sentiment_distribution[&Neu], 2);
        assert_eq!(report.sentiment_distribution[&Neg], 4);
    }

    #[tokio::test]
    async fn critical_reviews_are_capped_newest_first_and_scrubbed() {
        let mut corpus: Vec<CanonicalReview> = (0..8)
            .map(|i| {
                review(
                    i,
                    1,
                    SentimentCategory::Negative,
                    "broken, contact support@example.com",
                )
            })
            .collect();
        // one non-critical review that must not appear
        corpus.push(review(99, 5, SentimentCategory::Positive, "love it"));

        let generator = InsightGenerator::new(None, options());
        let assembler = SummaryAssembler::new(&generator, 10);
        let report = assembler.assemble(&corpus).await;

        assert_eq!(report.recent_critical_reviews.len(), 5);
        // newest critical first: ids 7,6,5,4,3
        assert_eq!(report.recent_critical_reviews[0].rating, 1);
        assert!(report.recent_critical_reviews[0]
            .timestamp
            .gt(&report.recent_critical_reviews[4].timestamp));
        for r in &report.recent_critical_reviews {
            assert!(r.text.contains("[EMAIL]"));
        }
    }

    #[tokio::test]
    async fn average_rating_rounds_to_two_decimals() {
        let corpus = vec![
            review(0, 5, SentimentCategory::Positive, "good"),
            review(1, 4, SentimentCategory::Positive, "good"),
            review(2, 4, SentimentCategory::Positive, "good"),
        ];
        let generator = InsightGenerator::new(None, options());
        let assembler = SummaryAssembler::new(&generator, 10);
        let report = assembler.assemble(&corpus).await;
        assert_eq!(report.average_rating, 4.33);
    }

    #[test]
    fn rendered_text_carries_headline_numbers() {
        let mut report = SummaryReport::empty();
        report.total_reviews = 12;
        report.average_rating = 4.1;
        let text = render_text(&report);
        assert!(text.contains("REVIEW SUMMARY REPORT"));
        assert!(text.contains("Total Reviews: 12"));
        assert!(text.contains("Average Rating: 4.1"));
    }
}
