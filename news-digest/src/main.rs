use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use email_delivery::{EmailDelivery, SmtpConfig};
use interfaces::FeedFile;
use news_digest::{
    collect, Aggregator, DigestConfig, DigestRound, EbookConverter, Fetcher, HtmlAttachment,
    OutputFormat, PandocEpub, RoundConfig,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FEEDS_FILE: &str = "feeds.txt";
const COVER_FILE: &str = "cover.png";

/// Collects recent posts from RSS/Atom feeds and mails them as one e-book.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding feeds.txt and cover.png
    #[arg(long, env = "CONFIG_PATH", default_value = "/config")]
    config_path: PathBuf,

    /// Run a single round and exit
    #[arg(long, env = "RUN_ONCE")]
    once: bool,

    /// Print the collected posts as JSON; deliver nothing, keep the watermark
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let digest_config = DigestConfig::from_env();
    let round_config = RoundConfig::from_env();
    let state = FeedFile::new(cli.config_path.join(FEEDS_FILE));

    let fetcher = Arc::new(Fetcher::new(digest_config.fetch.clone()).context("building HTTP client")?);
    let aggregator = Aggregator::new(fetcher, digest_config);

    if cli.dry_run {
        let (_, posts) = collect(&aggregator, &state, &round_config, Utc::now()).await?;
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }

    let sink = EmailDelivery::new(SmtpConfig::from_env()?)?;
    info!("Delivering to {}", sink.config().to);

    match round_config.output_format {
        OutputFormat::Epub => {
            let converter = PandocEpub::new(&round_config, cli.config_path.join(COVER_FILE), ".");
            serve(DigestRound::new(aggregator, converter, sink, state, round_config), cli.once).await
        }
        OutputFormat::Html => {
            serve(DigestRound::new(aggregator, HtmlAttachment, sink, state, round_config), cli.once).await
        }
    }
}

async fn serve<C: EbookConverter>(
    round: DigestRound<Fetcher, C, EmailDelivery, FeedFile>,
    once: bool,
) -> Result<()> {
    let period = Duration::from_secs(round.config().update_period_hours * 3600);
    loop {
        match round.run().await {
            Ok(report) => info!(
                "Round done: {} posts since {}, delivered: {}",
                report.posts, report.since, report.delivered
            ),
            Err(e) if once => return Err(e),
            Err(e) => error!("Round failed: {:#}", e),
        }
        if once {
            return Ok(());
        }
        info!("Sleeping {} hours", round.config().update_period_hours);
        tokio::time::sleep(period).await;
    }
}
