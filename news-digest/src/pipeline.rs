use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use interfaces::{DigestSink, FeedList, Post, WatermarkStore};
use tracing::{info, warn};

use crate::aggregator::Aggregator;
use crate::config::RoundConfig;
use crate::digest::render_digest;
use crate::traits::{EbookConverter, FeedFetcher};

/// What a round did, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub since: DateTime<Utc>,
    pub posts: usize,
    pub delivered: bool,
}

/// One collection round: gather posts since the watermark, deliver them as a
/// single document, then move the watermark forward.
pub struct DigestRound<F, C, S, W> {
    aggregator: Aggregator<F>,
    converter: C,
    sink: S,
    state: W,
    config: RoundConfig,
}

impl<F, C, S, W> DigestRound<F, C, S, W>
where
    F: FeedFetcher + 'static,
    C: EbookConverter,
    S: DigestSink,
    W: FeedList + WatermarkStore,
{
    pub fn new(aggregator: Aggregator<F>, converter: C, sink: S, state: W, config: RoundConfig) -> Self {
        Self {
            aggregator,
            converter,
            sink,
            state,
            config,
        }
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Run a full round. A conversion or delivery error is returned before
    /// the watermark moves, so the same posts are picked up next time.
    pub async fn run(&self) -> Result<RoundReport> {
        let now = Utc::now();
        let (since, posts) = collect(&self.aggregator, &self.state, &self.config, now).await?;

        let delivered = !posts.is_empty();
        if delivered {
            info!("Compiling newspaper");
            let html = render_digest(&posts);
            let document = self
                .converter
                .convert(&html)
                .await
                .context("converting digest")?;

            info!("Sending {} ({} bytes)", document.file_name, document.bytes.len());
            self.sink.deliver(&document).await.context("delivering digest")?;

            if let Some(artifact) = self.converter.artifact() {
                self.cleanup(artifact);
            }
        }

        if let Err(e) = self.state.advance(now) {
            warn!("Could not advance watermark: {:#}", e);
        }
        info!("Finished.");

        Ok(RoundReport {
            since,
            posts: posts.len(),
            delivered,
        })
    }

    fn cleanup(&self, artifact: &Path) {
        if self.config.keep_output {
            info!("Keeping output file {}", artifact.display());
            return;
        }
        info!("Cleaning up...");
        if let Err(e) = std::fs::remove_file(artifact) {
            warn!("Could not remove {}: {}", artifact.display(), e);
        }
    }
}

/// Posts of every listed feed since the round's starting point.
///
/// The start is `now - LOOKBACK_HOURS` when that is set, else the stored
/// watermark. Nothing is written.
pub async fn collect<F, W>(
    aggregator: &Aggregator<F>,
    state: &W,
    config: &RoundConfig,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, Vec<Post>)>
where
    F: FeedFetcher + 'static,
    W: FeedList + WatermarkStore,
{
    let since = start_of_round(state, config.lookback_hours, now)?;
    info!("Collecting posts since {}", since);

    let sources = FeedList::load(state)?;
    let posts = aggregator.aggregate(&sources, since).await;
    info!("Downloaded {} posts from {} feeds", posts.len(), sources.len());
    Ok((since, posts))
}

fn start_of_round<W: WatermarkStore>(
    state: &W,
    lookback_hours: Option<i64>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if let Some(hours) = lookback_hours {
        match Duration::try_hours(hours).and_then(|span| now.checked_sub_signed(span)) {
            Some(start) => return Ok(start),
            None => warn!("Invalid LOOKBACK_HOURS={}; using stored watermark", hours),
        }
    }
    WatermarkStore::load(state)
}
