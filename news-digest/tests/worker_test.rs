mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{entry, feed, hours_ago, init_tracing, post, titles, MockFetcher};
use news_digest::config::max_age_window;
use news_digest::types::{RawEntry, RawFeed};
use news_digest::{select_posts, DigestConfig, FeedPolicy, FeedWorker, FullTextProxy, Sanitizer};

fn policy(min_items: usize) -> FeedPolicy {
    FeedPolicy {
        min_items,
        ..Default::default()
    }
}

fn worker(fetcher: MockFetcher, config: DigestConfig) -> (Arc<MockFetcher>, FeedWorker<MockFetcher>) {
    let fetcher = Arc::new(fetcher);
    let sanitizer = Arc::new(Sanitizer::new(&config.sanitizer));
    let worker = FeedWorker::new(Arc::clone(&fetcher), Arc::new(config), sanitizer);
    (fetcher, worker)
}

#[test]
fn test_select_keeps_recent_in_ascending_order() {
    let now = Utc::now();
    let posts = vec![
        post("a", hours_ago(now, 1.0)),
        post("c", hours_ago(now, 3.0)),
        post("b", hours_ago(now, 2.0)),
    ];
    let selected = select_posts(posts, hours_ago(now, 2.5), now, &policy(0));
    assert_eq!(titles(&selected), vec!["b", "a"]);
}

#[test]
fn test_select_includes_post_at_watermark() {
    let now = Utc::now();
    let watermark = hours_ago(now, 2.0);
    let selected = select_posts(vec![post("edge", watermark)], watermark, now, &policy(0));
    assert_eq!(titles(&selected), vec!["edge"]);
}

#[test]
fn test_quota_fills_up_with_newest_posts() {
    let now = Utc::now();
    let posts: Vec<_> = (1..=10)
        .map(|i| post(&format!("p{}", i), hours_ago(now, i as f64)))
        .collect();
    let watermark = hours_ago(now, 1.5);

    let selected = select_posts(posts.clone(), watermark, now, &policy(3));
    assert_eq!(titles(&selected), vec!["p3", "p2", "p1"]);

    let selected = select_posts(posts, watermark, now, &policy(0));
    assert_eq!(titles(&selected), vec!["p1"]);
}

#[test]
fn test_quota_applies_when_watermark_excludes_everything() {
    let now = Utc::now();
    let posts: Vec<_> = (1..=10)
        .map(|i| post(&format!("p{}", i), hours_ago(now, i as f64)))
        .collect();
    let watermark = hours_ago(now, 0.5);

    let selected = select_posts(posts.clone(), watermark, now, &policy(3));
    assert_eq!(titles(&selected), vec!["p3", "p2", "p1"]);

    assert!(select_posts(posts, watermark, now, &policy(0)).is_empty());
}

#[test]
fn test_quota_not_used_when_enough_recent() {
    let now = Utc::now();
    let posts: Vec<_> = (1..=5)
        .map(|i| post(&format!("p{}", i), hours_ago(now, i as f64)))
        .collect();
    let selected = select_posts(posts, hours_ago(now, 4.5), now, &policy(2));
    assert_eq!(titles(&selected), vec!["p4", "p3", "p2", "p1"]);
}

#[test]
fn test_age_cutoff_applies_even_to_quota() {
    let now = Utc::now();
    let posts = vec![
        post("fresh", hours_ago(now, 2.0)),
        post("old", hours_ago(now, 30.0)),
        post("older", hours_ago(now, 50.0)),
    ];
    let selected = select_posts(posts, now - Duration::days(10), now, &policy(3));
    assert_eq!(titles(&selected), vec!["fresh"]);
}

#[test]
fn test_shorter_age_window() {
    let now = Utc::now();
    let posts = vec![post("a", hours_ago(now, 1.0)), post("b", hours_ago(now, 3.0))];
    let policy = FeedPolicy {
        max_age: max_age_window(Some(2.0)),
        ..Default::default()
    };
    let selected = select_posts(posts, now - Duration::days(1), now, &policy);
    assert_eq!(titles(&selected), vec!["a"]);
}

#[test]
fn test_age_window_clamped_to_a_day() {
    for hours in [0.0, -5.0, 999.0, f64::NAN, f64::INFINITY] {
        assert_eq!(max_age_window(Some(hours)), Duration::hours(24), "{}", hours);
    }
    assert_eq!(max_age_window(None), Duration::hours(24));
    assert_eq!(max_age_window(Some(24.0)), Duration::hours(24));
    assert_eq!(max_age_window(Some(0.5)), Duration::minutes(30));
}

#[tokio::test]
async fn test_worker_normalizes_and_selects() {
    init_tracing();
    let now = Utc::now();
    let raw = feed(
        "Example Blog",
        vec![
            entry("New", hours_ago(now, 1.0)),
            entry("Stale", hours_ago(now, 5.0)),
            RawEntry {
                link: None,
                ..entry("Linkless", hours_ago(now, 1.0))
            },
            RawEntry {
                updated: None,
                ..entry("Undated", hours_ago(now, 1.0))
            },
        ],
    );
    let (_, worker) = worker(
        MockFetcher::new().with_feed("https://example.com/feed", raw),
        DigestConfig::default(),
    );

    let posts = worker.run("https://example.com/feed", hours_ago(now, 2.0)).await;
    assert_eq!(titles(&posts), vec!["New"]);
    assert_eq!(posts[0].blog, "Example Blog");
    assert_eq!(posts[0].link, "https://example.com/new");
}

#[tokio::test]
async fn test_worker_names_untitled_feed() {
    let now = Utc::now();
    let raw = RawFeed {
        title: None,
        entries: vec![entry("Post", hours_ago(now, 1.0))],
        ..Default::default()
    };
    let (_, worker) = worker(MockFetcher::new().with_feed("u", raw), DigestConfig::default());
    let posts = worker.run("u", hours_ago(now, 2.0)).await;
    assert_eq!(posts[0].blog, "---");
}

#[tokio::test]
async fn test_worker_fetch_failure_yields_nothing() {
    init_tracing();
    let (_, worker) = worker(MockFetcher::new(), DigestConfig::default());
    assert!(worker.run("https://missing.example.com/feed", Utc::now()).await.is_empty());
}

#[tokio::test]
async fn test_malformed_feed_skipped_by_default() {
    init_tracing();
    let now = Utc::now();
    let raw = RawFeed {
        bozo: true,
        bozo_exception: Some("undefined entity".to_string()),
        ..feed("Broken", vec![entry("Post", hours_ago(now, 1.0))])
    };

    let (_, skipping) = worker(MockFetcher::new().with_feed("u", raw.clone()), DigestConfig::default());
    assert!(skipping.run("u", hours_ago(now, 2.0)).await.is_empty());

    let mut config = DigestConfig::default();
    config.policy.skip_malformed = false;
    let (_, tolerant) = worker(MockFetcher::new().with_feed("u", raw), config);
    assert_eq!(titles(&tolerant.run("u", hours_ago(now, 2.0)).await), vec!["Post"]);
}

#[tokio::test]
async fn test_worker_fetches_through_proxy() {
    let now = Utc::now();
    let proxied = "https://morss.it/:clip/https://example.com/feed%3Fformat%3Drss";
    let config = DigestConfig {
        proxy: Some(FullTextProxy::new("https://morss.it/", "")),
        ..Default::default()
    };
    let (fetcher, worker) = worker(
        MockFetcher::new().with_feed(proxied, feed("Full", vec![entry("Post", hours_ago(now, 1.0))])),
        config,
    );

    let posts = worker.run("https://example.com/feed?format=rss", hours_ago(now, 2.0)).await;
    assert_eq!(fetcher.requested(), vec![proxied.to_string()]);
    assert_eq!(titles(&posts), vec!["Post"]);
}
