//! SET (三立新聞) crawler.
//!
//! The group listing pages are fragile, so link discovery runs a
//! four-step selector cascade and falls back to a regex scan of the
//! homepage when the groups come back nearly empty. Article URLs keep
//! their `NewsID` query parameter as identity and drop everything else.

use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::warn;

use crate::error::Result;
use crate::extract;
use crate::http::{HttpClient, ARTICLE_TIMEOUT, LIST_TIMEOUT};
use crate::models::ArticleRecord;
use crate::scrapers::SiteScraper;
use crate::urls;

const SOURCE_CODE: &str = "SET";
const ORIGIN: &str = "https://www.setn.com";
// PageGroupID: 6 政治, 41 社會, 5 國際
const GROUP_IDS: [&str; 3] = ["6", "41", "5"];

/// Below this count the group pages are assumed broken and the homepage
/// scan kicks in.
const MIN_LISTING_URLS: usize = 5;

static NEWS_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"NewsID=(\d+)").unwrap());

pub struct SetScraper {
    http: HttpClient,
}

impl SetScraper {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SiteScraper for SetScraper {
    fn source_code(&self) -> &'static str {
        SOURCE_CODE
    }

    async fn list_article_urls(&self) -> Result<Vec<String>> {
        let mut all_urls = Vec::new();
        for group_id in GROUP_IDS {
            let list_url = format!("{}/ViewAll.aspx?PageGroupID={}", ORIGIN, group_id);
            match self.http.get_text(&list_url, LIST_TIMEOUT).await {
                Ok(html) => all_urls.extend(collect_listing_urls(&html)),
                Err(e) => warn!(group = group_id, error = %e, "failed to fetch SET group listing"),
            }
        }

        if all_urls.len() < MIN_LISTING_URLS {
            warn!(
                found = all_urls.len(),
                "few SET URLs from group pages; scanning homepage"
            );
            match self.http.get_text(ORIGIN, LIST_TIMEOUT).await {
                Ok(html) => all_urls.extend(homepage_urls(&html)),
                Err(e) => warn!(error = %e, "failed to fetch SET homepage"),
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

    // Selector cascade: the first step that finds anything wins.
    let cascade = [
        "h3.view-li-title a",
        "div.view-li-title a",
        "div.newsItems h3 a",
        r#"a[href*="/News.aspx"]"#,
    ];
    let mut hrefs: Vec<String> = Vec::new();
    for raw in cascade {
        let selector = Selector::parse(raw).unwrap();
        hrefs = document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();
        if !hrefs.is_empty() {
            break;
        }
    }

    hrefs
        .into_iter()
        .filter(|href| href.contains("/News.aspx"))
        .map(|href| normalize_article_url(&href))
        .collect()
}

/// Absolutize, undo double-prefix artifacts, then either rebuild the URL
/// from its NewsID alone or strip all parameters.
fn normalize_article_url(href: &str) -> String {
    let full = urls::absolutize(ORIGIN, href);
    let full = urls::repair_double_prefix(&full, ORIGIN);
    if full.contains('?') && full.contains("NewsID=") {
        match NEWS_ID.captures(&full) {
            Some(caps) => format!("{}/News.aspx?NewsID={}", ORIGIN, &caps[1]),
            None => full,
        }
    } else {
        urls::canonicalize(&full)
    }
}

fn homepage_urls(html: &str) -> Vec<String> {
    NEWS_ID
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .unique()
        .map(|news_id| format!("{}/News.aspx?NewsID={}", ORIGIN, news_id))
        .collect()
}

fn parse_article(url: &str, html: &str) -> Option<ArticleRecord> {
    let document = Html::parse_document(html);

    let (image_url, photographer) = extract_image_info(&document);

    let title =
        extract::select_first_text(&document, &["h1.news-title", "h1"]).unwrap_or_default();

    let noise = extract::parse_selectors(&["script", "style", ".article-ads", ".fb-quote"]);
    let body_cascade = [r#"[itemprop="articleBody"]"#, "div#Content1", "article"];
    let mut clean_text = String::new();
    for raw in body_cascade {
        let selector = Selector::parse(raw).unwrap();
        if let Some(node) = document.select(&selector).next() {
            clean_text = extract::text_without(node, &noise);
            break;
        }
    }

    // Meta tag first; the visible date cascade is the fallback.
    let published_at = extract::meta_content(&document, r#"meta[property="article:published_time"]"#)
        .as_deref()
        .and_then(extract::parse_datetime)
        .unwrap_or_else(|| {
            let visible = extract::select_first_text(
                &document,
                &["time.page_date", "time.page-date", "span.date"],
            );
            extract::timestamp_or_now(visible.as_deref())
        })
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    Some(ArticleRecord {
        source: SOURCE_CODE.to_string(),
        url: url.to_string(),
        title,
        publishedAt: published_at,
        rawHtml: String::new(),
        cleanText: clean_text,
        imageUrl: image_url,
        imagePhotographer: photographer,
    })
}

fn extract_image_info(document: &Html) -> (Option<String>, Option<String>) {
    let image_url = extract::meta_content(document, r#"meta[property="og:image"]"#)
        .or_else(|| extract::jsonld_image(document, false));

    let mut photographer = None;
    if let Some(caption) = extract::select_first_text(
        document,
        &["#ckuse figcaption", r#"[itemprop="articleBody"] figcaption"#],
    ) {
        photographer = extract::photographer_credit(&caption);
    }

    if photographer.is_none() {
        // First image alt in the content area as a last resort.
        for raw in ["#ckuse", r#"[itemprop="articleBody"]"#] {
            let selector = Selector::parse(raw).unwrap();
            if let Some(area) = document.select(&selector).next() {
                let img_selector = Selector::parse("img").unwrap();
                photographer = area
                    .select(&img_selector)
                    .next()
                    .and_then(|img| img.value().attr("alt"))
                    .and_then(extract::photographer_credit);
                break;
            }
        }
    }

    (image_url, photographer)
}
