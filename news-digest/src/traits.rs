use std::future::Future;
use std::path::Path;

use crate::types::{DigestDocument, RawFeed, Result};

/// Fetches and parses one feed.
///
/// Hard failures (network, HTTP status, unreadable body) are errors; a feed
/// that parsed only after recovery comes back with `bozo` set.
pub trait FeedFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<RawFeed>> + Send;
}

/// Turns the rendered HTML digest into the document that gets delivered.
pub trait EbookConverter: Send + Sync {
    fn convert(&self, html: &str) -> impl Future<Output = Result<DigestDocument>> + Send;

    /// File left on disk by `convert`, if any.
    fn artifact(&self) -> Option<&Path> {
        None
    }
}
