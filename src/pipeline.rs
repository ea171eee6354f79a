//! Run orchestration
//!
//! A `RunContext` owns every collaborator handle for one pipeline run:
//! provider adapters, the optional generative backend, and the validated
//! configuration. Nothing lives at module scope; the context is built,
//! driven once, and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::backend::{GeminiBackend, GenerativeBackend};
use crate::config::Config;
use crate::error::Result;
use crate::insight::{InsightGenerator, InsightOptions};
use crate::merge;
use crate::paginator::{self, PaginatorConfig};
use crate::providers::{AppFeedProvider, PlayMarketProvider, ProviderAdapter};
use crate::report::SummaryAssembler;
use crate::schemas::{CanonicalReview, RawReviewRecord, ReviewSource, SummaryReport};
use crate::sentiment;

/// Everything one run needs, built before any network activity
pub struct RunContext {
    pub config: Config,
    pub providers: Vec<Arc<dyn ProviderAdapter>>,
    pub backend: Option<Arc<dyn GenerativeBackend>>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("config", &self.config)
            .field("providers", &self.providers.len())
            .field("backend", &self.backend.is_some())
            .finish()
    }
}

impl RunContext {
    /// Validates the configuration and wires up collaborators.
    ///
    /// Fails fast on configuration errors; no request leaves this function.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let mut providers: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        let package = config
            .play_package
            .as_deref()
            .expect("validated configuration carries a Play package");
        providers.push(Arc::new(PlayMarketProvider::new(
            client.clone(),
            package,
            &config.play_lang,
            &config.play_country,
        )));
        info!(package, "Play Store provider initialized");

        if let Some(ref app_id) = config.app_store_id {
            providers.push(Arc::new(AppFeedProvider::new(
                client.clone(),
                app_id,
                &config.app_store_country,
            )));
            info!(app_id = %app_id, "App Store provider initialized");
        } else {
            info!("No App Store id configured, skipping that storefront");
        }

        let backend: Option<Arc<dyn GenerativeBackend>> = match config.gemini_api_key {
            Some(ref key) => {
                info!(model = %config.gemini_model, "Generative backend configured");
                Some(Arc::new(GeminiBackend::new(
                    client,
                    &config.gemini_model,
                    key,
                )))
            }
            None => {
                info!("No backend key configured, insights use the deterministic path");
                None
            }
        };

        Ok(Self {
            config,
            providers,
            backend,
        })
    }

    /// Fetches, merges and annotates the corpus for this run
    pub async fn collect_corpus(&self) -> Vec<CanonicalReview> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(self.config.window_days));
        let paginator_config = PaginatorConfig {
            cutoff,
            page_size: self.config.page_size,
            bucket_cap: self.config.bucket_cap,
            page_delay_ms: self.config.page_delay_ms,
        };

        let mut batches: Vec<(ReviewSource, Vec<RawReviewRecord>)> = Vec::new();
        for provider in &self.providers {
            let source = provider.source();
            let provider_batches =
                paginator::fetch_provider(provider.as_ref(), &paginator_config).await;
            let fetched: usize = provider_batches.iter().map(Vec::len).sum();
            if fetched == 0 {
                warn!(source = %source, "Provider yielded no in-window reviews");
            }
            batches.extend(provider_batches.into_iter().map(|b| (source, b)));
        }

        let mut corpus = merge::merge(batches, self.config.global_review_cap);
        sentiment::annotate(&mut corpus);
        corpus
    }

    /// Runs the whole pipeline and assembles the report
    pub async fn run(&self) -> SummaryReport {
        let corpus = self.collect_corpus().await;
        info!(records = corpus.len(), "Corpus ready for analysis");

        let generator = InsightGenerator::new(
            self.backend.clone(),
            InsightOptions::from(&self.config),
        );
        let assembler = SummaryAssembler::new(&generator, self.config.top_keywords);
        assembler.assemble(&corpus).await
    }
}
