//! # Square News Crawlers
//!
//! Crawlers for five Taiwanese news publishers that feed a central
//! ingestion API.
//!
//! ## Sources
//!
//! - CNA 中央社
//! - CTI 中天新聞
//! - LTN 自由時報
//! - SET 三立新聞
//! - UDN 聯合報
//!
//! ## Usage
//!
//! ```sh
//! # Crawl everything once and exit
//! square_news_crawlers
//!
//! # Serve the /run/{source} trigger endpoint
//! square_news_crawlers --listen 0.0.0.0:8080
//! ```
//!
//! ## Architecture
//!
//! Each crawl is a strictly sequential pipeline:
//! 1. **Listing**: fetch the site's fixed category pages and collect article URLs
//! 2. **Dedup**: ask the ingestion API which of those URLs are new
//! 3. **Extraction**: fetch each new article and extract a structured record
//! 4. **Ingestion**: POST each record to the API, one at a time

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod error;
mod extract;
mod http;
mod ingest;
mod models;
mod pipeline;
mod scrapers;
mod server;
mod urls;

use cli::Cli;
use http::HttpClient;
use ingest::IngestClient;
use server::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let cli = Cli::parse();
    info!(ingest_api_base = %cli.ingest_api_base, "Starting Square News crawlers");

    let http = HttpClient::new();
    let ingest = IngestClient::new(http.clone(), cli.ingest_api_base.clone(), cli.api_key.clone());
    let scrapers = scrapers::all_scrapers(&http);

    if let Some(addr) = &cli.listen {
        let state = Arc::new(AppState { ingest, scrapers });
        server::serve(addr, state).await?;
        return Ok(());
    }

    // ---- One-shot mode: run the selected crawlers sequentially ----
    let selected: Vec<_> = if cli.sources.is_empty() {
        scrapers.iter().collect()
    } else {
        scrapers
            .iter()
            .filter(|s| {
                cli.sources
                    .iter()
                    .any(|code| code.eq_ignore_ascii_case(s.source_code()))
            })
            .collect()
    };

    if selected.is_empty() {
        error!(sources = ?cli.sources, "no matching crawlers");
        return Err("no matching crawlers".into());
    }

    for scraper in selected {
        let summary = pipeline::run_site(scraper.as_ref(), &ingest).await;
        info!(
            source = scraper.source_code(),
            status = summary.status,
            ingested = summary.ingested,
            "crawl finished"
        );
        println!("{}: {}", scraper.source_code(), summary.message);
    }

    info!(elapsed = ?start_time.elapsed(), "All crawlers finished");
    Ok(())
}
