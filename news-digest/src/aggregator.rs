use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::config::DigestConfig;
use crate::sanitizer::Sanitizer;
use crate::traits::FeedFetcher;
use crate::types::Post;
use crate::worker::FeedWorker;

/// Runs one worker per source in parallel and merges their results.
pub struct Aggregator<F> {
    worker: FeedWorker<F>,
    limit: Option<Arc<Semaphore>>,
}

impl<F: FeedFetcher + 'static> Aggregator<F> {
    pub fn new(fetcher: Arc<F>, config: DigestConfig) -> Self {
        let sanitizer = Arc::new(Sanitizer::new(&config.sanitizer));
        let limit = config
            .max_concurrent_feeds
            .map(|permits| Arc::new(Semaphore::new(permits)));
        Self {
            worker: FeedWorker::new(fetcher, Arc::new(config), sanitizer),
            limit,
        }
    }

    /// All selected posts from `sources`, oldest first.
    ///
    /// Waits for every source; a failing or panicking worker only loses its
    /// own posts.
    pub async fn aggregate(&self, sources: &[String], watermark: DateTime<Utc>) -> Vec<Post> {
        info!("Aggregating {} feeds since {}", sources.len(), watermark);

        let handles: Vec<_> = sources
            .iter()
            .cloned()
            .map(|url| {
                let worker = self.worker.clone();
                let limit = self.limit.clone();
                tokio::spawn(async move {
                    let _permit = match limit {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    worker.run(&url, watermark).await
                })
            })
            .collect();

        let mut posts = Vec::new();
        for (url, joined) in sources.iter().zip(join_all(handles).await) {
            match joined {
                Ok(found) => posts.extend(found),
                Err(e) => error!("Worker for {} did not finish: {}", url, e),
            }
        }

        posts.sort_by_key(|post| post.time);
        info!("Aggregated {} posts", posts.len());
        posts
    }
}
