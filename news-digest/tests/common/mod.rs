#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use news_digest::types::{AggregatorError, Post, RawEntry, RawFeed, Result};
use news_digest::FeedFetcher;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Serves canned feeds by URL and remembers what was asked for.
#[derive(Default)]
pub struct MockFetcher {
    feeds: HashMap<String, RawFeed>,
    requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, feed: RawFeed) -> Self {
        self.feeds.insert(url.to_string(), feed);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl FeedFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<RawFeed> {
        self.requested.lock().unwrap().push(url.to_string());
        if url.starts_with("panic://") {
            panic!("fetcher blew up on {}", url);
        }
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| AggregatorError::General(format!("HTTP 404: {}", url)))
    }
}

pub fn hours_ago(now: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    now - Duration::milliseconds((hours * 3_600_000.0) as i64)
}

pub fn entry(title: &str, updated: DateTime<Utc>) -> RawEntry {
    RawEntry {
        updated: Some(updated),
        title: Some(title.to_string()),
        author: Some("Jane Doe".to_string()),
        link: Some(format!("https://example.com/{}", title.to_lowercase().replace(' ', "-"))),
        content: vec![format!("<p>{} body</p>", title)],
        ..Default::default()
    }
}

pub fn feed(title: &str, entries: Vec<RawEntry>) -> RawFeed {
    RawFeed {
        title: Some(title.to_string()),
        entries,
        ..Default::default()
    }
}

pub fn post(title: &str, time: DateTime<Utc>) -> Post {
    Post {
        time,
        blog: "Example Blog".to_string(),
        title: title.to_string(),
        author: "Jane Doe".to_string(),
        link: format!("https://example.com/{}", title),
        body: format!("<p>{}</p>", title),
    }
}

pub fn titles(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.title.as_str()).collect()
}
