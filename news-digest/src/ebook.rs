use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::RoundConfig;
use crate::traits::EbookConverter;
use crate::types::{AggregatorError, DigestDocument, Result};

pub const EPUB_FILE_NAME: &str = "dailynews.epub";
pub const EPUB_CONTENT_TYPE: &str = "application/epub+zip";
pub const HTML_FILE_NAME: &str = "dailynews.html";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// EPUB 3 through an external `pandoc`, written into the output directory.
#[derive(Debug, Clone)]
pub struct PandocEpub {
    pandoc: PathBuf,
    cover: PathBuf,
    title: String,
    lang: String,
    output: PathBuf,
}

impl PandocEpub {
    /// `cover` is only used when the file exists at conversion time.
    pub fn new(config: &RoundConfig, cover: impl Into<PathBuf>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            pandoc: config.pandoc_path.clone(),
            cover: cover.into(),
            title: config.epub_title.clone(),
            lang: config.epub_lang.clone(),
            output: output_dir.as_ref().join(EPUB_FILE_NAME),
        }
    }

    pub fn pandoc_args(&self) -> Vec<String> {
        let mut args = vec![
            "--from=html".to_string(),
            "--to=epub3".to_string(),
            "--standalone".to_string(),
            format!("--output={}", self.output.display()),
        ];
        if self.cover.is_file() {
            args.push(format!("--epub-cover-image={}", self.cover.display()));
        }
        args.push(format!("--metadata=title={}", self.title));
        args.push(format!("--metadata=lang={}", self.lang));
        args
    }
}

impl EbookConverter for PandocEpub {
    async fn convert(&self, html: &str) -> Result<DigestDocument> {
        let args = self.pandoc_args();
        debug!("Running {} {:?}", self.pandoc.display(), args);

        let mut child = Command::new(&self.pandoc)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(html.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(AggregatorError::Conversion(format!(
                "pandoc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let bytes = tokio::fs::read(&self.output).await?;
        info!("Created {} ({} bytes)", self.output.display(), bytes.len());

        Ok(DigestDocument {
            file_name: EPUB_FILE_NAME.to_string(),
            content_type: EPUB_CONTENT_TYPE.to_string(),
            bytes,
        })
    }

    fn artifact(&self) -> Option<&Path> {
        Some(&self.output)
    }
}

/// Delivers the rendered page itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlAttachment;

impl EbookConverter for HtmlAttachment {
    async fn convert(&self, html: &str) -> Result<DigestDocument> {
        Ok(DigestDocument {
            file_name: HTML_FILE_NAME.to_string(),
            content_type: HTML_CONTENT_TYPE.to_string(),
            bytes: html.as_bytes().to_vec(),
        })
    }
}
