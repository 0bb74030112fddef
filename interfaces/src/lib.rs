pub mod defs;
pub mod state;

pub use defs::{DigestDocument, DigestSink, FeedList, Post, WatermarkStore};
pub use state::FeedFile;
