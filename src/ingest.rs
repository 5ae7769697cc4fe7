//! Client for the remote ingestion API: the deduplication gate and the
//! article sink.
//!
//! The gate fails closed: on any transport failure or non-200 response it
//! reports that nothing is new, so a dedup-API outage drops a crawl cycle
//! instead of re-ingesting everything. The sink accepts exactly HTTP 202
//! as success; every other status is a logged failure with no retry at
//! this layer.

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::http::{is_accepted, HttpClient, API_TIMEOUT};
use crate::models::{ArticleRecord, CheckUrlsRequest};

/// Shared-key client for both ingest endpoints.
#[derive(Debug, Clone)]
pub struct IngestClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl IngestClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Ask the backend which of the candidate URLs it has not seen.
    ///
    /// An empty candidate set short-circuits without a network call.
    /// Anything other than a clean 200 with a JSON array body yields an
    /// empty set.
    pub async fn check_urls(&self, source_code: &str, urls: &[String]) -> Vec<String> {
        if urls.is_empty() {
            return Vec::new();
        }
        let endpoint = format!("{}/check-urls", self.base_url);
        let body = CheckUrlsRequest {
            sourceCode: source_code.to_string(),
            urls: urls.to_vec(),
        };
        match self
            .http
            .post_json(&endpoint, &self.api_key, &body, API_TIMEOUT)
            .await
        {
            Ok(resp) if resp.status() == StatusCode::OK => match resp.json::<Vec<String>>().await {
                Ok(new_urls) => new_urls,
                Err(e) => {
                    warn!(source = source_code, error = %e, "check-urls body was not a URL list");
                    Vec::new()
                }
            },
            Ok(resp) => {
                warn!(
                    source = source_code,
                    status = resp.status().as_u16(),
                    "check-urls returned non-200; treating all URLs as known"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(source = source_code, error = %e, "check-urls call failed; treating all URLs as known");
                Vec::new()
            }
        }
    }

    /// Post one article record. True only on HTTP 202.
    pub async fn submit_article(&self, record: &ArticleRecord) -> bool {
        let endpoint = format!("{}/articles", self.base_url);
        match self
            .http
            .post_json(&endpoint, &self.api_key, record, API_TIMEOUT)
            .await
        {
            Ok(resp) => {
                let accepted = is_accepted(resp.status());
                if accepted {
                    info!(source = %record.source, url = %record.url, "article accepted");
                } else {
                    warn!(
                        source = %record.source,
                        url = %record.url,
                        status = resp.status().as_u16(),
                        "article rejected by ingest API"
                    );
                }
                accepted
            }
            Err(e) => {
                warn!(source = %record.source, url = %record.url, error = %e, "article submission failed");
                false
            }
        }
    }
}
