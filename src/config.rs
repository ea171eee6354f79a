//! Configuration for the review pipeline
//!
//! Loaded from the environment (with `.env` support). Every tunable has a
//! documented default; `validate()` runs before any network activity and
//! turns a bad value into a fatal configuration error.

use serde::Deserialize;
use url::Url;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // App identifiers
    pub play_package: Option<String>,
    #[serde(default = "default_lang")]
    pub play_lang: String,
    #[serde(default = "default_country")]
    pub play_country: String,
    pub app_store_id: Option<String>,
    #[serde(default = "default_country")]
    pub app_store_country: String,

    // Collection window and caps
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_global_cap")]
    pub global_review_cap: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_bucket_cap")]
    pub bucket_cap: usize,
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,

    // Insight generation
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_theme_sample_cap")]
    pub theme_sample_cap: usize,
    #[serde(default = "default_action_sample_cap")]
    pub action_sample_cap: usize,
    #[serde(default = "default_quote_sample_cap")]
    pub quote_sample_cap: usize,
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
    #[serde(default = "default_top_themes")]
    pub top_themes: usize,
    #[serde(default = "default_quote_count")]
    pub quote_count: usize,

    // HTTP
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_window_days() -> u32 {
    7
}

fn default_global_cap() -> usize {
    5000
}

fn default_page_size() -> usize {
    200
}

fn default_bucket_cap() -> usize {
    1000
}

fn default_page_delay() -> u64 {
    500
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_theme_sample_cap() -> usize {
    100
}

fn default_action_sample_cap() -> usize {
    50
}

fn default_quote_sample_cap() -> usize {
    50
}

fn default_top_keywords() -> usize {
    10
}

fn default_top_themes() -> usize {
    5
}

fn default_quote_count() -> usize {
    3
}

fn default_request_timeout() -> u64 {
    30
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Validates every tunable as a positive integer and checks that at
    /// least the Play package identifier is present.
    pub fn validate(&self) -> Result<()> {
        let positives: [(&str, usize); 10] = [
            ("WINDOW_DAYS", self.window_days as usize),
            ("GLOBAL_REVIEW_CAP", self.global_review_cap),
            ("PAGE_SIZE", self.page_size),
            ("BUCKET_CAP", self.bucket_cap),
            ("THEME_SAMPLE_CAP", self.theme_sample_cap),
            ("ACTION_SAMPLE_CAP", self.action_sample_cap),
            ("QUOTE_SAMPLE_CAP", self.quote_sample_cap),
            ("TOP_KEYWORDS", self.top_keywords),
            ("TOP_THEMES", self.top_themes),
            ("QUOTE_COUNT", self.quote_count),
        ];
        for (name, value) in positives {
            if value == 0 {
                return Err(PipelineError::Config(format!(
                    "{name} must be a positive integer"
                )));
            }
        }

        match &self.play_package {
            Some(pkg) if !pkg.trim().is_empty() => Ok(()),
            _ => Err(PipelineError::Config(
                "no Play Store package identifier configured (set PLAY_PACKAGE or pass a store URL)"
                    .to_string(),
            )),
        }
    }

    pub fn has_app_store(&self) -> bool {
        self.app_store_id.is_some()
    }

    pub fn has_backend(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    /// Fills Play identifiers from a pasted store URL.
    ///
    /// Accepts `https://play.google.com/store/apps/details?id=<pkg>&hl=en_IN`.
    /// A region suffix in `hl` becomes the country when `gl` is absent.
    pub fn apply_play_url(&mut self, raw: &str) -> Result<()> {
        let url = Url::parse(raw.trim())
            .map_err(|e| PipelineError::Config(format!("invalid Play Store URL: {e}")))?;
        let host = url.host_str().unwrap_or_default().to_lowercase();
        if !host.contains("play.google.com") {
            return Err(PipelineError::Config(format!(
                "not a Play Store URL: {raw}"
            )));
        }

        let mut package = None;
        let mut lang = None;
        let mut country = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "id" => package = Some(value.to_string()),
                "hl" => lang = Some(value.to_string()),
                "gl" => country = Some(value.to_lowercase()),
                _ => {}
            }
        }

        let package = package.ok_or_else(|| {
            PipelineError::Config("Play Store URL carries no `id` parameter".to_string())
        })?;

        if let Some(l) = lang {
            // "en_IN" style: language before the underscore, region after
            match l.split_once('_') {
                Some((language, region)) => {
                    self.play_lang = language.to_string();
                    if country.is_none() {
                        country = Some(region.to_lowercase());
                    }
                }
                None => self.play_lang = l,
            }
        }
        if let Some(c) = country {
            self.play_country = c;
        }
        self.play_package = Some(package);
        Ok(())
    }

    /// Fills App Store identifiers from a pasted store URL.
    ///
    /// Accepts `https://apps.apple.com/<cc>/app/<slug>/id<digits>`.
    pub fn apply_app_store_url(&mut self, raw: &str) -> Result<()> {
        let url = Url::parse(raw.trim())
            .map_err(|e| PipelineError::Config(format!("invalid App Store URL: {e}")))?;
        let host = url.host_str().unwrap_or_default().to_lowercase();
        if !host.contains("apple.com") {
            return Err(PipelineError::Config(format!(
                "not an App Store URL: {raw}"
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();

        let id = segments
            .iter()
            .rev()
            .find_map(|seg| seg.strip_prefix("id"))
            .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::Config("App Store URL carries no `id<digits>` segment".to_string())
            })?;

        if let Some(first) = segments.first() {
            if first.len() == 2 && first.chars().all(|c| c.is_ascii_lowercase()) {
                self.app_store_country = first.to_string();
            }
        }
        self.app_store_id = Some(id);
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            play_package: None,
            play_lang: default_lang(),
            play_country: default_country(),
            app_store_id: None,
            app_store_country: default_country(),
            window_days: default_window_days(),
            global_review_cap: default_global_cap(),
            page_size: default_page_size(),
            bucket_cap: default_bucket_cap(),
            page_delay_ms: default_page_delay(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            theme_sample_cap: default_theme_sample_cap(),
            action_sample_cap: default_action_sample_cap(),
            quote_sample_cap: default_quote_sample_cap(),
            top_keywords: default_top_keywords(),
            top_themes: default_top_themes(),
            quote_count: default_quote_count(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}
