use std::borrow::Cow;

use feed_rs::model::{Entry, Feed, Link};
use feed_rs::parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::sanitizer::strip_illegal_chars;
use crate::types::{AggregatorError, RawEntry, RawFeed, Result};

static NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity pattern is valid"));

/// Entities every XML parser knows without a DTD.
const XML_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

/// Parse a fetched body into a [`RawFeed`].
///
/// A feed that only parses after recovery is returned with `bozo` set, so the
/// caller can decide whether to trust it.
pub fn parse_feed(body: &[u8], content_type: Option<&str>) -> Result<RawFeed> {
    debug!("Parsing feed content ({} bytes)", body.len());

    let mut bozo_exception = content_type
        .filter(|ct| !is_feed_content_type(ct))
        .map(|ct| format!("non-XML content type: {}", ct));

    let feed = match parser::parse(body) {
        Ok(feed) => feed,
        Err(strict) => {
            let text = String::from_utf8_lossy(body);
            let repaired = scrub_entities(&strip_illegal_chars(&text)).into_owned();
            let feed = parser::parse(repaired.as_bytes())
                .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;
            bozo_exception = Some(strict.to_string());
            feed
        }
    };

    let mut parsed = raw_feed(feed);
    parsed.bozo = bozo_exception.is_some();
    parsed.bozo_exception = bozo_exception;
    Ok(parsed)
}

fn is_feed_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ["xml", "json", "rss", "atom"]
        .iter()
        .any(|marker| essence.contains(marker))
}

/// Replace HTML-only named entities (`&nbsp;`, `&mdash;`, ...) with the
/// characters they stand for. Unknown names are escaped so the ampersand
/// survives as text.
pub fn scrub_entities(xml: &str) -> Cow<'_, str> {
    NAMED_ENTITY.replace_all(xml, |caps: &regex::Captures| {
        let name = &caps[1];
        if XML_ENTITIES.contains(&name) {
            return caps[0].to_string();
        }
        let decoded = html_escape::decode_html_entities(&caps[0]);
        if decoded == caps[0] {
            format!("&amp;{};", name)
        } else {
            html_escape::encode_text(&decoded).into_owned()
        }
    })
}

fn raw_feed(feed: Feed) -> RawFeed {
    let title = feed.title.map(|t| t.content);
    let entries: Vec<RawEntry> = feed.entries.into_iter().map(raw_entry).collect();
    debug!("Parsed feed with {} entries", entries.len());

    RawFeed {
        title,
        entries,
        ..Default::default()
    }
}

/// The `alternate` link (or one without `rel`), else whatever comes first.
fn article_link(links: Vec<Link>) -> Option<String> {
    let alternate = links
        .iter()
        .position(|link| matches!(link.rel.as_deref(), None | Some("alternate")));
    links
        .into_iter()
        .nth(alternate.unwrap_or(0))
        .map(|link| link.href)
}

fn raw_entry(entry: Entry) -> RawEntry {
    let mut names = entry
        .authors
        .into_iter()
        .map(|person| person.name)
        .filter(|name| !name.trim().is_empty());
    let author = names.next();
    let contributors = names
        .chain(entry.contributors.into_iter().map(|person| person.name))
        .collect();

    RawEntry {
        updated: entry.updated,
        published: entry.published,
        title: entry.title.map(|t| t.content),
        author,
        contributors,
        link: article_link(entry.links),
        content: entry.content.and_then(|c| c.body).into_iter().collect(),
        summary: entry.summary.map(|s| s.content),
    }
}
