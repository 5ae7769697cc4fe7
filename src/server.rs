//! HTTP trigger endpoint.
//!
//! Exposes one route per deployment model of the original crawlers: an
//! external scheduler hits `/run/{source}` and gets back the plain-text
//! crawl summary. Crawls run inline on the request so the scheduler's
//! own timeout bounds them.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::ingest::IngestClient;
use crate::pipeline::{self, CrawlSummary};
use crate::scrapers::SiteScraper;

pub struct AppState {
    pub ingest: IngestClient,
    pub scrapers: Vec<Box<dyn SiteScraper>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/run/:source", get(run_crawler).post(run_crawler))
        .with_state(state)
}

async fn run_crawler(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> Response {
    let Some(scraper) = state
        .scrapers
        .iter()
        .find(|s| s.source_code().eq_ignore_ascii_case(&source))
    else {
        return (
            StatusCode::NOT_FOUND,
            format!("unknown source: {}", source),
        )
            .into_response();
    };

    let summary = pipeline::run_site(scraper.as_ref(), &state.ingest).await;
    summary_response(summary)
}

fn summary_response(summary: CrawlSummary) -> Response {
    let status =
        StatusCode::from_u16(summary.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, summary.message).into_response()
}

pub async fn serve(addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening for crawl triggers");
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClient;
    use std::time::Duration;

    fn test_state() -> Arc<AppState> {
        let http = HttpClient::new().with_backoff(0, Duration::from_millis(0));
        Arc::new(AppState {
            ingest: IngestClient::new(http.clone(), "http://127.0.0.1:9/ingest", "test-key"),
            scrapers: crate::scrapers::all_scrapers(&http),
        })
    }

    #[tokio::test]
    async fn test_unknown_source_is_404() {
        let router = router(test_state());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let resp = reqwest::get(format!("http://{}/run/BBC", addr)).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        assert!(resp.text().await.unwrap().contains("unknown source"));
    }

    #[test]
    fn test_summary_status_maps_onto_http_status() {
        let resp = summary_response(CrawlSummary {
            status: 500,
            message: "Failed to fetch list: timeout".to_string(),
            ingested: 0,
        });
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
