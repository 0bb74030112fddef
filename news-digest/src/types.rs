use chrono::{DateTime, Utc};

pub use interfaces::defs::{DigestDocument, Post};

pub const USER_AGENT: &str = "news-digest/1.0 (+https://github.com/)";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_redirects: 5,
        }
    }
}

/// A fetched and parsed feed, before any normalization.
///
/// `bozo` is raised when the feed could only be read after recovering from
/// malformed content (or was served with a non-feed content type);
/// `bozo_exception` carries the detail for the log.
#[derive(Debug, Clone, Default)]
pub struct RawFeed {
    pub title: Option<String>,
    pub entries: Vec<RawEntry>,
    pub bozo: bool,
    pub bozo_exception: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub updated: Option<DateTime<Utc>>,
    pub published: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub contributors: Vec<String>,
    pub link: Option<String>,
    pub content: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
