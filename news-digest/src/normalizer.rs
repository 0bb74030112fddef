//! Turns one raw feed entry into a [`Post`], or says why it cannot.

use chrono::{DateTime, Utc};

use crate::sanitizer::Sanitizer;
use crate::types::{Post, RawEntry};

pub const DEFAULT_TITLE: &str = "Null";
pub const DEFAULT_AUTHOR: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("entry has neither an updated nor a published date")]
    Undateable,

    #[error("entry at {time} is older than the watermark {watermark}")]
    BeforeWatermark {
        time: DateTime<Utc>,
        watermark: DateTime<Utc>,
    },

    #[error("entry has no link")]
    MissingLink,

    #[error("entry body is empty after sanitizing")]
    EmptyBody,
}

pub fn normalize(
    entry: &RawEntry,
    blog: &str,
    watermark: Option<DateTime<Utc>>,
    sanitizer: &Sanitizer,
) -> Result<Post, Rejection> {
    let time = entry
        .updated
        .or(entry.published)
        .ok_or(Rejection::Undateable)?;

    if let Some(watermark) = watermark {
        if time < watermark {
            return Err(Rejection::BeforeWatermark { time, watermark });
        }
    }

    let link = entry
        .link
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .ok_or(Rejection::MissingLink)?;

    let title = entry.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let author = author_of(entry);
    let body = entry
        .content
        .first()
        .or(entry.summary.as_ref())
        .map(String::as_str)
        .unwrap_or_default();

    let body = sanitizer.sanitize_body(body);
    if body.trim().is_empty() {
        return Err(Rejection::EmptyBody);
    }

    Ok(Post {
        time,
        blog: sanitizer.sanitize_field(blog),
        title: sanitizer.sanitize_field(title),
        author: sanitizer.sanitize_field(&author),
        link: sanitizer.sanitize_field(link),
        body,
    })
}

fn author_of(entry: &RawEntry) -> String {
    if let Some(author) = entry.author.as_deref().filter(|a| !a.trim().is_empty()) {
        return author.to_string();
    }
    let contributors = entry
        .contributors
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if contributors.is_empty() {
        DEFAULT_AUTHOR.to_string()
    } else {
        contributors
    }
}
