//! Sentiment classification
//!
//! A lexicon polarity scorer over review text. The score lands in [-1, 1];
//! bucketing into positive/neutral/negative at +0.1 / -0.1 is pipeline
//! policy, not part of the scorer.

use crate::schemas::{CanonicalReview, SentimentCategory};

const POSITIVE: &[&str] = &[
    "good", "great", "excellent", "love", "loved", "awesome", "amazing", "perfect",
    "best", "fast", "quick", "smooth", "helpful", "easy", "convenient", "nice",
    "useful", "reliable", "recommend",
];

const NEGATIVE: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "crash", "crashes", "crashing", "slow",
    "laggy", "lag", "broken", "worst", "hate", "scam", "fraud", "bug", "buggy",
    "annoying", "useless", "rude", "nightmare", "frustrating", "stuck", "failed",
    "fails", "failing",
];

const NEGATORS: &[&str] = &["not", "no", "never", "dont", "doesnt", "cant", "cannot", "wont"];

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Scores a text's polarity in [-1, 1]. Empty or lexicon-free text is 0.0.
///
/// A sentiment word directly preceded by a negator contributes to the
/// opposite pole ("not good" reads as negative).
pub fn polarity(text: &str) -> f64 {
    let tokens = tokenize(text);
    let mut positive = 0i32;
    let mut negative = 0i32;

    for (i, token) in tokens.iter().enumerate() {
        let negated = i > 0 && NEGATORS.contains(&tokens[i - 1].as_str());
        if POSITIVE.contains(&token.as_str()) {
            if negated {
                negative += 1;
            } else {
                positive += 1;
            }
        } else if NEGATIVE.contains(&token.as_str()) {
            if negated {
                positive += 1;
            } else {
                negative += 1;
            }
        }
    }

    let total = positive + negative;
    if total == 0 {
        0.0
    } else {
        f64::from(positive - negative) / f64::from(total)
    }
}

/// Buckets a polarity score with the fixed +0.1 / -0.1 thresholds
pub fn categorize(score: f64) -> SentimentCategory {
    if score > 0.1 {
        SentimentCategory::Positive
    } else if score < -0.1 {
        SentimentCategory::Negative
    } else {
        SentimentCategory::Neutral
    }
}

/// Analyzes one text: (category, score)
pub fn analyze(text: &str) -> (SentimentCategory, f64) {
    let score = polarity(text);
    (categorize(score), score)
}

/// Annotates every review in the corpus in place
pub fn annotate(corpus: &mut [CanonicalReview]) {
    for review in corpus {
        let (category, score) = analyze(&review.text);
        review.sentiment = Some(category);
        review.sentiment_score = score;
    }
}
