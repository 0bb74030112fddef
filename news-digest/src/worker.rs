use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{DigestConfig, FeedPolicy};
use crate::normalizer::{normalize, Rejection};
use crate::sanitizer::Sanitizer;
use crate::traits::FeedFetcher;
use crate::types::Post;

/// Display name for feeds without a title.
pub const UNTITLED_FEED: &str = "---";

/// Processes a single source: fetch, normalize, then apply the time policy.
///
/// Every failure is logged and turns into an empty result; a worker never
/// fails the round.
pub struct FeedWorker<F> {
    fetcher: Arc<F>,
    config: Arc<DigestConfig>,
    sanitizer: Arc<Sanitizer>,
}

impl<F> Clone for FeedWorker<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            config: Arc::clone(&self.config),
            sanitizer: Arc::clone(&self.sanitizer),
        }
    }
}

impl<F: FeedFetcher> FeedWorker<F> {
    pub fn new(fetcher: Arc<F>, config: Arc<DigestConfig>, sanitizer: Arc<Sanitizer>) -> Self {
        Self {
            fetcher,
            config,
            sanitizer,
        }
    }

    pub async fn run(&self, url: &str, watermark: DateTime<Utc>) -> Vec<Post> {
        let target = match &self.config.proxy {
            Some(proxy) => proxy.rewrite(url),
            None => url.to_string(),
        };

        let feed = match self.fetcher.fetch(&target).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                return Vec::new();
            }
        };

        if feed.bozo {
            warn!(
                "Malformed feed {}: {}",
                url,
                feed.bozo_exception.as_deref().unwrap_or("unknown problem")
            );
            if self.config.policy.skip_malformed {
                return Vec::new();
            }
        }

        let blog = self
            .sanitizer
            .sanitize_field(feed.title.as_deref().unwrap_or(UNTITLED_FEED));

        let posts: Vec<Post> = feed
            .entries
            .iter()
            .filter_map(|entry| match normalize(entry, &blog, None, &self.sanitizer) {
                Ok(post) => Some(post),
                Err(Rejection::MissingLink) => {
                    debug!("Skipping entry without link in {}", url);
                    None
                }
                Err(_) => None,
            })
            .collect();

        let total = posts.len();
        let selected = select_posts(posts, watermark, Utc::now(), &self.config.policy);
        info!("{}: {} of {} entries selected", blog, selected.len(), total);
        selected
    }
}

/// Time policy for one source.
///
/// Posts older than `now - max_age` are never returned. Of the rest, those at
/// or after `watermark` are kept; when `min_items` is set and fewer than that
/// are recent, the `min_items` newest posts are returned instead. The result
/// is ordered oldest first.
pub fn select_posts(
    mut posts: Vec<Post>,
    watermark: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &FeedPolicy,
) -> Vec<Post> {
    posts.sort_by(|a, b| b.time.cmp(&a.time));

    let cutoff = now - policy.max_age;
    posts.retain(|post| post.time >= cutoff);

    let recent = posts.iter().filter(|post| post.time >= watermark).count();
    let mut selected: Vec<Post> = if policy.min_items > 0 && recent < policy.min_items {
        posts.into_iter().take(policy.min_items).collect()
    } else {
        posts.into_iter().filter(|post| post.time >= watermark).collect()
    };

    selected.sort_by_key(|post| post.time);
    selected
}
