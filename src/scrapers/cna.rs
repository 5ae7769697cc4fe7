//! CNA (中央社) crawler.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::warn;

use crate::error::Result;
use crate::extract;
use crate::http::{HttpClient, ARTICLE_TIMEOUT, LIST_TIMEOUT};
use crate::models::ArticleRecord;
use crate::scrapers::SiteScraper;
use crate::urls;

const SOURCE_CODE: &str = "CNA";
const ORIGIN: &str = "https://www.cna.com.tw";
// aipl: 政治, asoc: 社會, aopl: 國際
const CATEGORY_CODES: [&str; 3] = ["aipl", "asoc", "aopl"];

pub struct CnaScraper {
    http: HttpClient,
}

impl CnaScraper {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SiteScraper for CnaScraper {
    fn source_code(&self) -> &'static str {
        SOURCE_CODE
    }

    async fn list_article_urls(&self) -> Result<Vec<String>> {
        let mut all_urls = Vec::new();
        for code in CATEGORY_CODES {
            let list_url = format!("{}/list/{}.aspx", ORIGIN, code);
            match self.http.get_text(&list_url, LIST_TIMEOUT).await {
                Ok(html) => all_urls.extend(collect_listing_urls(&html)),
                Err(e) => warn!(category = code, error = %e, "failed to fetch CNA listing"),
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
    let link_selector = Selector::parse("ul.mainList li a").unwrap();
    let mut found = Vec::new();
    for a in document.select(&link_selector) {
        let href = a.value().attr("href").unwrap_or("");
        if href.contains("/news/") {
            found.push(urls::strip_query(&urls::absolutize(ORIGIN, href)));
        }
    }
    found
}

fn parse_article(url: &str, html: &str) -> Option<ArticleRecord> {
    let document = Html::parse_document(html);

    let title = extract::select_first_text(&document, &["h1 span", "h1"]).unwrap_or_default();

    let noise = extract::parse_selectors(&["script", "style", ".article-ads", ".more-news"]);
    let body_selector = Selector::parse("div.paragraph").unwrap();
    let clean_text = document
        .select(&body_selector)
        .next()
        .map(|node| extract::text_without(node, &noise))
        .unwrap_or_default();

    let time_text = extract::select_first_text(&document, &["div.updatetime span", "time"]);
    let published_at = extract::timestamp_or_now(time_text.as_deref())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    Some(ArticleRecord {
        source: SOURCE_CODE.to_string(),
        url: url.to_string(),
        title,
        publishedAt: published_at,
        rawHtml: String::new(),
        cleanText: clean_text,
        imageUrl: None,
        imagePhotographer: None,
    })
}
