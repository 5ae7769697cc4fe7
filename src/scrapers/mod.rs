//! Per-publisher crawlers.
//!
//! Each site module implements the same two-phase pattern: collect
//! candidate article URLs from a fixed set of category pages, then
//! extract one [`ArticleRecord`] per article page through a cascade of
//! site-specific selectors. The listing and extraction logic is kept in
//! pure functions over HTML strings so it can be exercised on fixture
//! pages without a network.
//!
//! | Source | Module | Listing method | Notes |
//! |--------|--------|----------------|-------|
//! | CNA 中央社 | [`cna`] | category pages | |
//! | CTI 中天 | [`cti`] | homepage regex scan | category allow-list gate, TLS verify off |
//! | LTN 自由時報 | [`ltn`] | category pages | paragraph-level body extraction |
//! | SET 三立 | [`set`] | group pages + homepage fallback | image/photographer extraction |
//! | UDN 聯合報 | [`udn`] | breaknews pages | image/photographer extraction |

use async_trait::async_trait;

use crate::error::Result;
use crate::http::HttpClient;
use crate::models::ArticleRecord;

pub mod cna;
pub mod cti;
pub mod ltn;
pub mod set;
pub mod udn;

/// One publisher crawler. Implementations own their HTTP client so a
/// site can deviate from the shared transport settings (CTI does).
#[async_trait]
pub trait SiteScraper: Send + Sync {
    /// Publisher short code used by the ingest API.
    fn source_code(&self) -> &'static str;

    /// Fetch the fixed category set and collect candidate article URLs,
    /// normalized per site. Per-category fetch failures are logged and
    /// skipped; an error from this method means the whole listing phase
    /// failed and the crawl cannot proceed.
    async fn list_article_urls(&self) -> Result<Vec<String>>;

    /// Fetch and extract one article page. `Ok(None)` means the page
    /// yielded no record (gated category, nothing extractable).
    async fn scrape_article(&self, url: &str) -> Result<Option<ArticleRecord>>;
}

/// All five crawlers sharing one pooled client (CTI builds its own).
pub fn all_scrapers(http: &HttpClient) -> Vec<Box<dyn SiteScraper>> {
    vec![
        Box::new(cna::CnaScraper::new(http.clone())),
        Box::new(cti::CtiScraper::new()),
        Box::new(ltn::LtnScraper::new(http.clone())),
        Box::new(set::SetScraper::new(http.clone())),
        Box::new(udn::UdnScraper::new(http.clone())),
    ]
}
