//! Shared HTTP client with bounded transient-status retries.
//!
//! One connection-pooled [`reqwest::Client`] is built per process lifetime
//! and shared read-only across every request of an invocation. Transient
//! statuses (429 and the common 5xx family) and transport errors are
//! retried a bounded number of times with exponential backoff and jitter;
//! after the retries are exhausted a status response is handed back to the
//! caller unchanged, matching a session that never raises on status.

use std::time::Duration;

use rand::{rng, Rng};
use reqwest::{Client, Response, StatusCode};
use tokio::time::sleep;
use tracing::warn;

use crate::error::{CrawlError, Result};

/// Browser-like UA; several of the sites serve bot-detection pages to
/// anything that looks like a default HTTP library.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Timeout for listing-page fetches.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for article-page fetches.
pub const ARTICLE_TIMEOUT: Duration = Duration::from_secs(20);
/// Timeout for dedup-check and article-submission calls.
pub const API_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection-reusing client plus the retry policy applied to every
/// request sent through it.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl HttpClient {
    /// Standard client used by four of the five sites and the ingest API.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Client that skips TLS certificate verification. CTI's certificate
    /// chain is intermittently broken; only that site's fetches use this.
    pub fn insecure() -> Self {
        Self::build(true)
    }

    fn build(accept_invalid_certs: bool) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(10)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .unwrap_or_default();
        Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Override the retry policy. Tests use this to drop the backoff
    /// delays to zero.
    pub fn with_backoff(mut self, max_retries: usize, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// GET a page and return its body text. Non-2xx after retries is an
    /// error; the callers treat it like any other transport failure.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .send_with_retry(url, || self.client.get(url).timeout(timeout))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }

    /// POST a JSON body with the ingest API key header. The response is
    /// returned as-is; callers decide which status spells success.
    pub async fn post_json<B: serde::Serialize>(
        &self,
        url: &str,
        api_key: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Response> {
        self.send_with_retry(url, || {
            self.client
                .post(url)
                .header("X-API-KEY", api_key)
                .json(body)
                .timeout(timeout)
        })
        .await
    }

    async fn send_with_retry(
        &self,
        url: &str,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<Response> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(resp) if !RETRY_STATUSES.contains(&resp.status().as_u16()) => {
                    return Ok(resp);
                }
                // Out of retries: hand the final transient-status response
                // back unchanged for the caller to judge.
                Ok(resp) if attempt > self.max_retries => return Ok(resp),
                Ok(resp) => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        %url,
                        attempt,
                        max = self.max_retries,
                        status = resp.status().as_u16(),
                        ?delay,
                        "transient status; backing off"
                    );
                    sleep(delay).await;
                }
                Err(e) if attempt > self.max_retries => return Err(e.into()),
                Err(e) => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        %url,
                        attempt,
                        max = self.max_retries,
                        error = %e,
                        ?delay,
                        "request failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let mut delay = self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// True when this status should count as an ingest-API success. Exactly
/// 202; every other code, 2xx included, is a failure.
pub fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::ACCEPTED
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_retries_transient_status_then_succeeds() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let router = Router::new().route(
            "/page",
            get(move || {
                let hits = Arc::clone(&hits_clone);
                async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                        (axum::http::StatusCode::SERVICE_UNAVAILABLE, "busy")
                    } else {
                        (axum::http::StatusCode::OK, "hello")
                    }
                }
            }),
        );
        let base = serve(router).await;

        let client = HttpClient::new().with_backoff(3, Duration::from_millis(0));
        let body = client
            .get_text(&format!("{}/page", base), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(body, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_status_is_an_error_without_retry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let router = Router::new().route(
            "/page",
            get(move || {
                let hits = Arc::clone(&hits_clone);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (axum::http::StatusCode::FORBIDDEN, "nope")
                }
            }),
        );
        let base = serve(router).await;

        let client = HttpClient::new().with_backoff(3, Duration::from_millis(0));
        let err = client
            .get_text(&format!("{}/page", base), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CrawlError::Status { status, .. } if status == StatusCode::FORBIDDEN
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_is_accepted_only_202() {
        assert!(is_accepted(StatusCode::ACCEPTED));
        assert!(!is_accepted(StatusCode::OK));
        assert!(!is_accepted(StatusCode::CREATED));
        assert!(!is_accepted(StatusCode::BAD_REQUEST));
    }
}
