//! LTN (自由時報) crawler.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::warn;

use crate::error::Result;
use crate::extract;
use crate::http::{HttpClient, ARTICLE_TIMEOUT, LIST_TIMEOUT};
use crate::models::ArticleRecord;
use crate::scrapers::SiteScraper;

const SOURCE_CODE: &str = "LTN";
const CATEGORIES: [&str; 3] = ["politics", "society", "world"];

// App-nag lines that show up as paragraphs inside the article body.
const BANNED_PHRASES: [&str; 2] = ["請繼續往下閱讀", "點我下載APP"];

pub struct LtnScraper {
    http: HttpClient,
}

impl LtnScraper {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SiteScraper for LtnScraper {
    fn source_code(&self) -> &'static str {
        SOURCE_CODE
    }

    async fn list_article_urls(&self) -> Result<Vec<String>> {
        let mut all_urls = Vec::new();
        for cat in CATEGORIES {
            let list_url = format!("https://news.ltn.com.tw/list/breakingnews/{}", cat);
            match self.http.get_text(&list_url, LIST_TIMEOUT).await {
                Ok(html) => all_urls.extend(collect_listing_urls(&html)),
                Err(e) => warn!(category = cat, error = %e, "failed to fetch LTN listing"),
            }
        }
        Ok(all_urls)
    }

    async fn scrape_article(&self, url: &str) -> Result<Option<ArticleRecord>> {
        let html = self.http.get_text(url, ARTICLE_TIMEOUT).await?;
        Ok(parse_article(url, &html))
    }
}

fn collect_listing_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("ul.list li a").unwrap();
    document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("/news/") && href.contains("breakingnews"))
        .map(str::to_string)
        .collect()
}

fn parse_article(url: &str, html: &str) -> Option<ArticleRecord> {
    let document = Html::parse_document(html);

    let title =
        extract::select_first_text(&document, &["div.whitecon h1", "h1"]).unwrap_or_default();

    let noise = extract::parse_selectors(&[
        "script",
        "style",
        ".article_popular",
        ".apps",
        ".boxTitle",
        ".author",
        ".disclaim",
        ".further_reading",
    ]);
    let body_cascade = ["article", "div.text"];
    let mut clean_text = String::new();
    for raw in body_cascade {
        let selector = Selector::parse(raw).unwrap();
        if let Some(node) = document.select(&selector).next() {
            // Prefer paragraph-level extraction with line-noise filtering;
            // containers without <p> fall back to whole-container text.
            clean_text = extract::paragraph_text(node, &noise, &BANNED_PHRASES)
                .unwrap_or_else(|| extract::text_without(node, &noise));
            break;
        }
    }

    let time_text = extract::select_first_text(&document, &["span.time"]);
    let published_at = extract::timestamp_or_now(time_text.as_deref())
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();

    Some(ArticleRecord {
        source: SOURCE_CODE.to_string(),
        url: url.to_string(),
        title,
        publishedAt: published_at,
        rawHtml: html.to_string(),
        cleanText: clean_text,
        imageUrl: None,
        imagePhotographer: None,
    })
}
