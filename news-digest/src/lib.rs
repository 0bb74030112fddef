pub mod types;
pub mod traits;
pub mod config;
pub mod sanitizer;
pub mod parser;
pub mod fetcher;
pub mod normalizer;
pub mod worker;
pub mod aggregator;
pub mod digest;
pub mod ebook;
pub mod pipeline;

pub use types::*;
pub use traits::{EbookConverter, FeedFetcher};
pub use config::{DigestConfig, FeedPolicy, FullTextProxy, OutputFormat, RoundConfig, SanitizerConfig};
pub use sanitizer::{Sanitizer, SanitizerMode};
pub use parser::parse_feed;
pub use fetcher::Fetcher;
pub use normalizer::{normalize, Rejection};
pub use worker::{select_posts, FeedWorker};
pub use aggregator::Aggregator;
pub use digest::render_digest;
pub use ebook::{HtmlAttachment, PandocEpub};
pub use pipeline::{collect, DigestRound, RoundReport};
