//! Deduplication and merge
//!
//! Combines the raw batches from all buckets and providers into one capped,
//! newest-first canonical corpus. Merging is commutative, associative and
//! idempotent on record identity, so batches may arrive in any order and a
//! future parallel fetcher needs no changes here.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::schemas::{CanonicalReview, RawReviewRecord, ReviewSource};

/// Characters of review text folded into an identity fingerprint
const FINGERPRINT_TEXT_LEN: usize = 20;

/// Set of identity keys seen during one run; never persisted
pub type DedupIndex = HashSet<String>;

/// Computes SHA-256 of content as lowercase hex
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identity key for a normalized review, namespaced by source so two
/// storefronts can never alias each other.
///
/// Uses the provider id when present; otherwise a fingerprint over author,
/// timestamp and the first characters of the text.
pub fn identity_key(review: &CanonicalReview) -> String {
    format!("{}:{}", review.source.id(), review.id)
}

fn fingerprint(source: ReviewSource, author: &str, ts: &str, text: &str) -> String {
    let prefix: String = text.chars().take(FINGERPRINT_TEXT_LEN).collect();
    compute_hash(&format!("{}|{}|{}|{}", source.id(), author, ts, prefix))
}

/// Normalizes one provider-shaped record into the canonical schema.
///
/// Rating, text and timestamp are required; a rating outside 1-5 counts as
/// malformed. Id-less records get a stable fingerprint id.
pub fn normalize(raw: RawReviewRecord, source: ReviewSource) -> Result<CanonicalReview> {
    let rating = raw.rating.ok_or(PipelineError::MissingField("rating"))?;
    if !(1..=5).contains(&rating) {
        return Err(PipelineError::MissingField("rating"));
    }
    let text = raw.text.ok_or(PipelineError::MissingField("text"))?;
    let timestamp = raw.timestamp.ok_or(PipelineError::MissingField("timestamp"))?;

    let author = raw.author.unwrap_or_default();
    let id = match raw.id {
        Some(id) if !id.is_empty() => id,
        _ => fingerprint(source, &author, &timestamp.to_rfc3339(), &text),
    };

    Ok(CanonicalReview {
        id,
        source,
        rating,
        text,
        timestamp,
        author,
        app_version: raw.app_version,
        developer_reply: raw.developer_reply,
        reply_timestamp: raw.reply_timestamp,
        vote_count: raw.vote_count.unwrap_or(0),
        sentiment: None,
        sentiment_score: 0.0,
    })
}

/// Merges raw batches into one deduplicated corpus, newest first, capped at
/// `global_cap`. Malformed records are dropped with a warning, never fatal.
pub fn merge(
    batches: Vec<(ReviewSource, Vec<RawReviewRecord>)>,
    global_cap: usize,
) -> Vec<CanonicalReview> {
    let mut seen: DedupIndex = DedupIndex::new();
    let mut corpus: Vec<CanonicalReview> = Vec::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;

    for (source, batch) in batches {
        for raw in batch {
            let review = match normalize(raw, source) {
                Ok(review) => review,
                Err(e) => {
                    dropped += 1;
                    warn!(source = %source, error = %e, "Dropping malformed review record");
                    continue;
                }
            };
            if !seen.insert(identity_key(&review)) {
                duplicates += 1;
                continue;
            }
            corpus.push(review);
        }
    }

    // Newest first; timestamp ties break by lexical id for reproducibility.
    corpus.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    if corpus.len() > global_cap {
        debug!(
            total = corpus.len(),
            cap = global_cap,
            "Truncating corpus to most recent records"
        );
        corpus.truncate(global_cap);
    }

    debug!(
        records = corpus.len(),
        dropped, duplicates, "Merge completed"
    );
    corpus
}
