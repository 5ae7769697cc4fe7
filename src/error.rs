//! Error types shared across the crawlers.
//!
//! Every per-URL failure is caught by the pipeline and turned into a log
//! line plus a skip, so these variants exist mostly to carry context into
//! those log lines rather than to surface to a caller.

use thiserror::Error;

/// Errors raised while fetching listings, articles, or talking to the
/// ingestion API.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Transport-level failure: connect error, timeout, body read error.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but with a status we do not accept even after
    /// the transient-status retries were exhausted.
    #[error("unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

pub type Result<T> = std::result::Result<T, CrawlError>;
