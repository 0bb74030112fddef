use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized feed entry, ready to be rendered into the digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub time: DateTime<Utc>,
    pub blog: String,
    pub title: String,
    pub author: String,
    pub link: String,
    pub body: String,
}

/// A rendered and converted digest, as handed to delivery.
#[derive(Clone, Debug)]
pub struct DigestDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Supplies the feed URLs for a round. Order carries no meaning.
pub trait FeedList {
    fn load(&self) -> Result<Vec<String>>;
}

/// The cutoff below which entries count as already delivered.
pub trait WatermarkStore {
    fn load(&self) -> Result<DateTime<Utc>>;
    fn advance(&self, to: DateTime<Utc>) -> Result<()>;
}

/// Final destination of a digest document.
pub trait DigestSink {
    fn deliver(&self, document: &DigestDocument) -> impl Future<Output = Result<()>> + Send;
}

// Object style note:
// Posts live for a single round. Nothing in the workspace persists them; the
// only state carried between rounds is the watermark, owned by whichever
// WatermarkStore the round is wired with.
