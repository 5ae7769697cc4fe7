//! Command-line interface definitions for the Square News crawlers.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the crawler binary.
///
/// With `--listen` the binary serves the `/run/{source}` trigger endpoint;
/// without it, the crawlers named by `--sources` run once, sequentially,
/// and the process exits.
///
/// # Examples
///
/// ```sh
/// # One-shot run of every crawler
/// square_news_crawlers
///
/// # One-shot run of two crawlers
/// square_news_crawlers -s CNA,UDN
///
/// # Serve the trigger endpoint for an external scheduler
/// square_news_crawlers --listen 0.0.0.0:8080
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Source codes to crawl in a one-shot run (defaults to all five)
    #[arg(short, long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Address to serve the /run/{source} trigger endpoint on
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Base URL of the ingestion API
    #[arg(
        long,
        env = "INGEST_API_BASE",
        default_value = "https://square-news-632027619686.asia-east1.run.app/ingest"
    )]
    pub ingest_api_base: String,

    /// API key sent as X-API-KEY on every ingestion request
    #[arg(long, env = "API_KEY", default_value = "temporary-api-key-123")]
    pub api_key: String,
}
