//! Windowed stratified pagination
//!
//! Drives repeated page pulls per rating bucket per provider until a stop
//! condition holds. Relevance-sorted feeds under-sample 1- and 5-star
//! reviews, so providers that can filter by rating get one independent
//! newest-first stream per star value; providers that cannot get a single
//! unfiltered stream.
//!
//! Providers are not guaranteed strictly chronological order within a page,
//! so staleness is only ever declared after scanning a whole page.

use chrono::{DateTime, Utc};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::providers::{ProviderAdapter, PullRequest};
use crate::schemas::RawReviewRecord;

/// Absolute ceiling on pages pulled per bucket, regardless of configuration
const HARD_MAX_PAGES: usize = 50;

/// Pagination tunables, fixed for the duration of a run
#[derive(Debug, Clone, Copy)]
pub struct PaginatorConfig {
    /// Records older than this are out of window
    pub cutoff: DateTime<Utc>,
    pub page_size: usize,
    /// Per-bucket collection cap
    pub bucket_cap: usize,
    /// Fixed delay between successive page pulls within a bucket
    pub page_delay_ms: u64,
}

impl PaginatorConfig {
    /// Pages allowed for one bucket: enough to fill the cap, never more
    /// than the hard ceiling.
    fn max_pages(&self) -> usize {
        self.bucket_cap.div_ceil(self.page_size).clamp(1, HARD_MAX_PAGES)
    }
}

/// Per-bucket pagination state, destroyed when the bucket's stream finishes
#[derive(Debug, Default)]
struct FetchState {
    cursor: Option<String>,
    collected: usize,
    pages: usize,
    exhausted: bool,
}

/// Fetches one rating bucket from a provider until a stop condition holds.
///
/// Stop conditions, checked after every page in order: the provider returns
/// no continuation cursor; the bucket cap is reached; the page contains no
/// in-window records. A transport failure aborts this bucket only and
/// returns whatever was collected.
pub async fn fetch_bucket(
    provider: &dyn ProviderAdapter,
    rating_filter: Option<u8>,
    config: &PaginatorConfig,
) -> Vec<RawReviewRecord> {
    let source = provider.source();
    let max_pages = config.max_pages();
    let mut state = FetchState::default();
    let mut collected: Vec<RawReviewRecord> = Vec::new();

    while !state.exhausted && state.pages < max_pages {
        if state.pages > 0 {
            sleep(Duration::from_millis(config.page_delay_ms)).await;
        }

        let request = PullRequest {
            cursor: state.cursor.clone(),
            rating_filter,
            page_size: config.page_size,
        };

        let page = match provider.pull(request).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    source = %source,
                    rating = ?rating_filter,
                    page = state.pages,
                    error = %e,
                    "Page pull failed, keeping partial bucket"
                );
                break;
            }
        };
        state.pages += 1;

        // Scan the entire page: a stale record followed by fresher ones
        // within the same page must not end the stream.
        let page_len = page.items.len();
        let fresh: Vec<RawReviewRecord> = page
            .items
            .into_iter()
            .filter(|r| r.timestamp.is_some_and(|ts| ts >= config.cutoff))
            .collect();
        let had_recent = !fresh.is_empty();

        debug!(
            source = %source,
            rating = ?rating_filter,
            page = state.pages,
            records = page_len,
            in_window = had_recent,
            "Fetched page"
        );

        state.collected += fresh.len();
        collected.extend(fresh);

        if page.next_cursor.is_none() {
            state.exhausted = true;
        } else if state.collected >= config.bucket_cap {
            debug!(
                source = %source,
                rating = ?rating_filter,
                collected = state.collected,
                "Bucket cap reached"
            );
            state.exhausted = true;
        } else if !had_recent {
            // Paged past the window
            debug!(
                source = %source,
                rating = ?rating_filter,
                page = state.pages,
                "Page has no recent items"
            );
            state.exhausted = true;
        } else {
            state.cursor = page.next_cursor;
        }
    }

    collected.truncate(config.bucket_cap);
    collected
}

/// Fetches all buckets of one provider, strictly sequentially.
///
/// Returns one raw batch per bucket; batches are merged later, so a failed
/// bucket simply contributes fewer records.
pub async fn fetch_provider(
    provider: &dyn ProviderAdapter,
    config: &PaginatorConfig,
) -> Vec<Vec<RawReviewRecord>> {
    let buckets: Vec<Option<u8>> = if provider.metadata().supports_rating_filter {
        (1..=5).map(Some).collect()
    } else {
        vec![None]
    };

    let mut batches = Vec::with_capacity(buckets.len());
    for rating in buckets {
        let batch = fetch_bucket(provider, rating, config).await;
        info!(
            source = %provider.source(),
            rating = ?rating,
            records = batch.len(),
            "Bucket fetch completed"
        );
        batches.push(batch);
    }
    batches
}
