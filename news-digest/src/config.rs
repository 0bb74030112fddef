//! Run configuration, read once per process from environment-style keys.
//!
//! Everything is resolved through a lookup function so the same parsing runs
//! against `std::env` in the binary and against plain maps in tests. Invalid
//! values never abort a run: they are logged and replaced by the documented
//! default.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use tracing::warn;

use crate::types::FetchConfig;

pub const DEFAULT_MAX_AGE_HOURS: f64 = 24.0;
pub const DEFAULT_PROXY_URL: &str = "https://morss.it";
pub const DEFAULT_PROXY_MODE: &str = "clip";
pub const DEFAULT_UPDATE_PERIOD_HOURS: u64 = 12;

/// Rewrites feed URLs through a full-article extraction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTextProxy {
    pub base_url: String,
    pub mode: String,
}

impl FullTextProxy {
    pub fn new(base_url: &str, mode: &str) -> Self {
        let mode = mode.trim();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            mode: if mode.is_empty() { DEFAULT_PROXY_MODE } else { mode }.to_string(),
        }
    }

    /// `{base}/:{mode}/{url}` with the feed URL percent-encoded, keeping `:` and `/`.
    pub fn rewrite(&self, url: &str) -> String {
        let encoded = urlencoding::encode(url)
            .replace("%3A", ":")
            .replace("%2F", "/");
        format!("{}/:{}/{}", self.base_url, self.mode, encoded)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPolicy {
    /// Quota fallback threshold; 0 disables it.
    pub min_items: usize,
    pub max_age: Duration,
    pub skip_malformed: bool,
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self {
            min_items: 0,
            max_age: max_age_window(None),
            skip_malformed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizerConfig {
    pub sanitize_html: bool,
    pub strip_images: bool,
    pub text_only: bool,
    pub max_chars: Option<usize>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            sanitize_html: true,
            strip_images: true,
            text_only: false,
            max_chars: None,
        }
    }
}

/// Everything a feed worker needs, built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct DigestConfig {
    pub proxy: Option<FullTextProxy>,
    pub policy: FeedPolicy,
    pub sanitizer: SanitizerConfig,
    pub fetch: FetchConfig,
    pub max_concurrent_feeds: Option<usize>,
}

impl DigestConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let proxy = flag(&lookup, "FULLTEXT_MORSS", false).then(|| {
            FullTextProxy::new(
                &lookup("MORSS_URL").unwrap_or_else(|| DEFAULT_PROXY_URL.to_string()),
                &lookup("MORSS_MODE").unwrap_or_default(),
            )
        });

        let policy = FeedPolicy {
            min_items: parsed::<usize>(&lookup, "MIN_ITEMS_PER_FEED").unwrap_or(0),
            max_age: max_age_window(parsed::<f64>(&lookup, "MAX_POST_AGE_HOURS")),
            skip_malformed: flag(&lookup, "SKIP_BOZO", true),
        };

        let sanitizer = SanitizerConfig {
            sanitize_html: flag(&lookup, "SANITIZE_HTML", true),
            strip_images: flag(&lookup, "STRIP_IMAGES", true),
            text_only: flag(&lookup, "TEXT_ONLY", false),
            max_chars: parsed::<usize>(&lookup, "MAX_BODY_CHARS").filter(|n| *n > 0),
        };

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            timeout_seconds: parsed::<u64>(&lookup, "FETCH_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.timeout_seconds),
            max_retries: parsed::<u32>(&lookup, "FETCH_RETRIES").unwrap_or(defaults.max_retries),
            ..defaults
        };

        Self {
            proxy,
            policy,
            sanitizer,
            fetch,
            max_concurrent_feeds: parsed::<usize>(&lookup, "MAX_CONCURRENT_FEEDS").filter(|n| *n > 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Epub,
    Html,
}

/// Settings of the round loop around the core: watermark override,
/// document conversion and scheduling.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub lookback_hours: Option<i64>,
    pub output_format: OutputFormat,
    pub pandoc_path: PathBuf,
    pub epub_title: String,
    pub epub_lang: String,
    pub keep_output: bool,
    pub update_period_hours: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            lookback_hours: None,
            output_format: OutputFormat::Epub,
            pandoc_path: PathBuf::from("/usr/bin/pandoc"),
            epub_title: "Daily News".to_string(),
            epub_lang: "en".to_string(),
            keep_output: false,
            update_period_hours: DEFAULT_UPDATE_PERIOD_HOURS,
        }
    }
}

impl RoundConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let output_format = match lookup("OUTPUT_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
            None => defaults.output_format,
            Some(v) if v.is_empty() || v == "epub" => OutputFormat::Epub,
            Some(v) if v == "html" => OutputFormat::Html,
            Some(v) => {
                warn!("Invalid OUTPUT_FORMAT={:?}; using epub", v);
                OutputFormat::Epub
            }
        };

        Self {
            lookback_hours: parsed::<i64>(&lookup, "LOOKBACK_HOURS"),
            output_format,
            pandoc_path: non_blank(&lookup, "PANDOC_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.pandoc_path),
            epub_title: non_blank(&lookup, "EPUB_TITLE").unwrap_or(defaults.epub_title),
            epub_lang: non_blank(&lookup, "EPUB_LANG").unwrap_or(defaults.epub_lang),
            keep_output: flag(&lookup, "KEEP_OUTPUT", false),
            update_period_hours: parsed::<u64>(&lookup, "UPDATE_PERIOD")
                .filter(|hours| *hours > 0)
                .unwrap_or(defaults.update_period_hours),
        }
    }
}

/// Age window for the feed worker. Anything outside (0, 24] hours falls back
/// to the 24 hour default.
pub fn max_age_window(hours: Option<f64>) -> Duration {
    let hours = match hours {
        Some(h) if h > 0.0 && h <= DEFAULT_MAX_AGE_HOURS => h,
        Some(h) => {
            warn!("MAX_POST_AGE_HOURS={} outside (0, 24]; using 24", h);
            DEFAULT_MAX_AGE_HOURS
        }
        None => DEFAULT_MAX_AGE_HOURS,
    };
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// `1`, `true`, `yes` and `y` (any case) are true; blank or unset means `default`.
fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        ),
        _ => default,
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = non_blank(lookup, key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Invalid {}={:?}; using default", key, raw);
            None
        }
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
