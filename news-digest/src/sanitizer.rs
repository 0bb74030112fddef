//! Text cleanup for entry fields.
//!
//! Every field loses the characters XML cannot carry. Bodies additionally go
//! through markup cleaning when the `html-clean` capability is available and
//! enabled, and are finally truncated if a length limit is configured.
//! Truncation counts characters and ignores markup, so a cut can land inside
//! a tag.

use tracing::warn;

use crate::config::SanitizerConfig;

/// How bodies are treated, decided once when the sanitizer is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizerMode {
    /// Parse the body and rebuild it without unwanted elements.
    Clean,
    /// Leave the markup alone.
    Passthrough,
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    mode: SanitizerMode,
    strip_images: bool,
    text_only: bool,
    max_chars: Option<usize>,
}

impl Sanitizer {
    pub fn new(config: &SanitizerConfig) -> Self {
        Self {
            mode: resolve_mode(config.sanitize_html),
            strip_images: config.strip_images,
            text_only: config.text_only,
            max_chars: config.max_chars,
        }
    }

    pub fn mode(&self) -> SanitizerMode {
        self.mode
    }

    /// Title, author, blog name and link.
    pub fn sanitize_field(&self, raw: &str) -> String {
        strip_illegal_chars(raw)
    }

    pub fn sanitize_body(&self, raw: &str) -> String {
        let text = strip_illegal_chars(raw);
        let cleaned = match self.mode {
            #[cfg(feature = "html-clean")]
            SanitizerMode::Clean => markup::clean(&text, self.strip_images, self.text_only),
            #[cfg(not(feature = "html-clean"))]
            SanitizerMode::Clean => text,
            SanitizerMode::Passthrough => text,
        };
        match self.max_chars {
            Some(limit) => truncate_chars(cleaned, limit),
            None => cleaned,
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&SanitizerConfig::default())
    }
}

fn resolve_mode(requested: bool) -> SanitizerMode {
    if !requested {
        return SanitizerMode::Passthrough;
    }
    if cfg!(feature = "html-clean") {
        SanitizerMode::Clean
    } else {
        warn!("SANITIZE_HTML is on but this build has no html-clean support; bodies pass through unparsed");
        SanitizerMode::Passthrough
    }
}

/// Drop characters outside the XML 1.0 `Char` production.
pub fn strip_illegal_chars(raw: &str) -> String {
    raw.chars().filter(|c| is_xml_char(*c)).collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn truncate_chars(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text,
    }
}

#[cfg(feature = "html-clean")]
mod markup {
    use html_escape::{encode_double_quoted_attribute, encode_text};
    use scraper::{ElementRef, Html, Node};

    use super::strip_illegal_chars;

    /// Removed together with everything inside them.
    const DROPPED: &[&str] = &[
        "script", "style", "iframe", "svg", "video", "audio", "form",
        // raw-text containers that cannot be re-serialized faithfully
        "noscript", "template", "noembed", "noframes", "xmp", "plaintext",
    ];

    const VOID: &[&str] = &[
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ];

    const BLOCK: &[&str] = &[
        "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
        "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
        "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
    ];

    pub(super) fn clean(text: &str, strip_images: bool, text_only: bool) -> String {
        let fragment = Html::parse_fragment(text);
        let root = fragment.root_element();

        if text_only {
            let mut visible = String::new();
            collect_text(root, strip_images, &mut visible);
            return visible
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| format!("<p>{}</p>", encode_text(line)))
                .collect::<Vec<_>>()
                .join("\n");
        }

        let mut out = String::with_capacity(text.len());
        write_children(root, strip_images, &mut out);
        out
    }

    fn is_dropped(name: &str, strip_images: bool) -> bool {
        DROPPED.contains(&name) || (strip_images && name == "img")
    }

    fn write_children(parent: ElementRef<'_>, strip_images: bool, out: &mut String) {
        for child in parent.children() {
            match child.value() {
                // character references decode to anything, legal or not
                Node::Text(text) => out.push_str(&encode_text(&strip_illegal_chars(text))),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        write_element(element, strip_images, out);
                    }
                }
                // comments, doctypes and processing instructions go
                _ => {}
            }
        }
    }

    fn write_element(element: ElementRef<'_>, strip_images: bool, out: &mut String) {
        let name = element.value().name();
        if is_dropped(name, strip_images) {
            return;
        }

        out.push('<');
        out.push_str(name);
        for (attr, value) in element.value().attrs() {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&encode_double_quoted_attribute(&strip_illegal_chars(value)));
            out.push('"');
        }
        out.push('>');

        if VOID.contains(&name) {
            return;
        }

        // The parser eats one newline right after these start tags.
        if matches!(name, "pre" | "textarea" | "listing") {
            let leading_newline = element
                .children()
                .next()
                .and_then(|first| first.value().as_text().map(|t| t.starts_with('\n')))
                .unwrap_or(false);
            if leading_newline {
                out.push('\n');
            }
        }

        write_children(element, strip_images, out);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    fn collect_text(parent: ElementRef<'_>, strip_images: bool, out: &mut String) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&strip_illegal_chars(text)),
                Node::Element(_) => {
                    let Some(element) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let name = element.value().name();
                    if is_dropped(name, strip_images) {
                        continue;
                    }
                    let block = BLOCK.contains(&name);
                    if block {
                        out.push('\n');
                    }
                    collect_text(element, strip_images, out);
                    if block {
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }
    }
}
