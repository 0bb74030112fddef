use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::defs::{FeedList, WatermarkStore};

/// The feeds file doubles as the watermark: its modification time is the
/// instant of the last completed round.
#[derive(Clone, Debug)]
pub struct FeedFile {
    path: PathBuf,
}

impl FeedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Strip whitespace and drop blank or `#` comment lines.
pub fn parse_feed_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

impl FeedList for FeedFile {
    fn load(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading feed list from {}", self.path.display()))?;
        Ok(parse_feed_lines(&content))
    }
}

impl WatermarkStore for FeedFile {
    fn load(&self) -> Result<DateTime<Utc>> {
        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("reading modification time of {}", self.path.display()))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn advance(&self, to: DateTime<Utc>) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.set_modified(SystemTime::from(to))
            .with_context(|| format!("touching {}", self.path.display()))?;
        Ok(())
    }
}
