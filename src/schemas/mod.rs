//! Canonical data schemas for the review pipeline
//!
//! Provider payloads are loosely typed and live inside each adapter;
//! everything past the normalization boundary uses the types here.

pub mod report;
pub mod review;

pub use report::{CriticalReview, InsightResult, SummaryReport, Theme};
pub use review::{CanonicalReview, RawReviewRecord, ReviewSource, SentimentCategory};
