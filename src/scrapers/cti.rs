//! CTI (中天) crawler.
//!
//! CTI has no usable category listing, so candidate URLs come from a
//! regex scan of the homepage markup. Articles outside the allowed
//! categories are gated out entirely rather than ingested partially.

use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::Result;
use crate::extract;
use crate::http::{HttpClient, ARTICLE_TIMEOUT, LIST_TIMEOUT};
use crate::models::ArticleRecord;
use crate::scrapers::SiteScraper;

const SOURCE_CODE: &str = "CTI";
const ORIGIN: &str = "https://ctinews.com";

const ALLOWED_CATEGORIES: [&str; 5] = ["政治", "社會", "國際", "要聞", "全球"];

static ITEM_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/news/items/[a-zA-Z0-9]+").unwrap());

pub struct CtiScraper {
    http: HttpClient,
}

impl CtiScraper {
    /// CTI's certificate chain is intermittently broken, so this site
    /// alone uses a client with TLS verification disabled.
    pub fn new() -> Self {
        Self {
            http: HttpClient::insecure(),
        }
    }
}

impl Default for CtiScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteScraper for CtiScraper {
    fn source_code(&self) -> &'static str {
        SOURCE_CODE
    }

    /// Single-page listing: a failed homepage fetch fails the whole
    /// crawl, which the orchestrator reports with a 500.
    async fn list_article_urls(&self) -> Result<Vec<String>> {
        let html = self.http.get_text(ORIGIN, LIST_TIMEOUT).await?;
        Ok(collect_listing_urls(&html))
    }

    async fn scrape_article(&self, url: &str) -> Result<Option<ArticleRecord>> {
        let html = self.http.get_text(url, ARTICLE_TIMEOUT).await?;
        Ok(parse_article(url, &html))
    }
}

fn collect_listing_urls(html: &str) -> Vec<String> {
    ITEM_PATH
        .find_iter(html)
        .map(|m| format!("{}{}", ORIGIN, m.as_str()))
        .unique()
        .collect()
}

fn parse_article(url: &str, html: &str) -> Option<ArticleRecord> {
    let document = Html::parse_document(html);

    // Category gate: a recognizable label outside the allow-list means
    // the article is dropped outright, not ingested partially.
    let category = extract::select_first_text(&document, &["a.category-name", ".category"])
        .unwrap_or_default();
    if !category.is_empty() && !ALLOWED_CATEGORIES.iter().any(|c| category.contains(c)) {
        debug!(%url, %category, "skipping CTI article outside allowed categories");
        return None;
    }

    let title =
        extract::select_first_text(&document, &["h1.article-title", "h1"]).unwrap_or_default();

    let noise = extract::parse_selectors(&["script", "style", ".ad-container", ".related-news"]);
    let body_cascade = ["div.article-content", "div.article-body", "div.text"];
    let mut clean_text = String::new();
    for raw in body_cascade {
        let selector = Selector::parse(raw).unwrap();
        if let Some(node) = document.select(&selector).next() {
            clean_text = extract::text_without(node, &noise);
            break;
        }
    }

    // datetime attribute preferred over the rendered text.
    let time_value = time_value(&document);
    let published_at = extract::timestamp_or_now(time_value.as_deref())
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

fn time_value(document: &Html) -> Option<String> {
    for raw in ["time.pub-date", "time"] {
        let selector = Selector::parse(raw).unwrap();
        if let Some(el) = document.select(&selector).next() {
            return el
                .value()
                .attr("datetime")
                .map(str::to_string)
                .filter(|s| !s.is_empty())
                .or_else(|| Some(extract::element_text(el)));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_listing_urls_dedups_homepage_matches() {
        let html = r#"
            <a href="/news/items/Abc123xyz">a</a>
            <a href="/news/items/Abc123xyz">same again</a>
            <a href="/news/items/Def456">b</a>
            <a href="/video/items/NotNews">c</a>
        "#;
        let urls = collect_listing_urls(html);
        assert_eq!(
            urls,
            vec![
                "https://ctinews.com/news/items/Abc123xyz".to_string(),
                "https://ctinews.com/news/items/Def456".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_article_allowed_category() {
        let html = r#"
            <a class="category-name">政治</a>
            <h1 class="article-title">立院三讀通過</h1>
            <time class="pub-date" datetime="2026-01-10T09:00:00+08:00">2026/01/10</time>
            <div class="article-content">
                <p>內文第一段。</p>
                <div class="related-news">相關新聞</div>
            </div>
        "#;
        let record = parse_article("https://ctinews.com/news/items/Abc", html).unwrap();
        assert_eq!(record.title, "立院三讀通過");
        assert_eq!(record.publishedAt, "2026-01-10T09:00:00");
        assert_eq!(record.cleanText, "內文第一段。");
        assert!(!record.rawHtml.is_empty());
    }

    #[test]
    fn test_parse_article_gated_category_yields_no_record() {
        let html = r#"
            <a class="category-name">娛樂</a>
            <h1 class="article-title">明星新聞</h1>
            <div class="article-content"><p>內文</p></div>
        "#;
        assert!(parse_article("https://ctinews.com/news/items/Ent", html).is_none());
    }

    #[test]
    fn test_parse_article_missing_category_passes_gate() {
        let html = r#"
            <h1>無分類文章</h1>
            <div class="article-body"><p>內文</p></div>
        "#;
        let record = parse_article("https://ctinews.com/news/items/NoCat", html).unwrap();
        assert_eq!(record.title, "無分類文章");
        assert_eq!(record.cleanText, "內文");
    }

    #[test]
    fn test_time_value_prefers_datetime_attr() {
        let document = Html::parse_document(
            r#"<time class="pub-date" datetime="2026-01-10T09:00:00+08:00">顯示文字</time>"#,
        );
        assert_eq!(
            time_value(&document),
            Some("2026-01-10T09:00:00+08:00".to_string())
        );
    }

    #[test]
    fn test_time_value_falls_back_to_text() {
        let document = Html::parse_document(r#"<time>2026/01/10 09:00</time>"#);
        assert_eq!(time_value(&document), Some("2026/01/10 09:00".to_string()));
    }
}
