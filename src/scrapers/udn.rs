//! UDN (聯合報) crawler.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::warn;

use crate::error::Result;
use crate::extract;
use crate::http::{HttpClient, ARTICLE_TIMEOUT, LIST_TIMEOUT};
use crate::models::ArticleRecord;
use crate::scrapers::SiteScraper;
use crate::urls;

const SOURCE_CODE: &str = "UDN";
const ORIGIN: &str = "https://udn.com";
// 分類代碼: 1 要聞/政治, 2 社會, 5 國際
const CATEGORY_IDS: [&str; 3] = ["1", "2", "5"];

pub struct UdnScraper {
    http: HttpClient,
}

impl UdnScraper {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SiteScraper for UdnScraper {
    fn source_code(&self) -> &'static str {
        SOURCE_CODE
    }

    async fn list_article_urls(&self) -> Result<Vec<String>> {
        let mut all_urls = Vec::new();
        for cat_id in CATEGORY_IDS {
            let list_url = format!("{}/news/breaknews/1/{}", ORIGIN, cat_id);
            match self.http.get_text(&list_url, LIST_TIMEOUT).await {
                Ok(html) => all_urls.extend(collect_listing_urls(&html)),
                Err(e) => warn!(category = cat_id, error = %e, "failed to fetch UDN listing"),
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
    let link_selector = Selector::parse("div.story-list__text h2 a").unwrap();
    document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| urls::absolutize(ORIGIN, &urls::canonicalize(href)))
        .collect()
}

fn parse_article(url: &str, html: &str) -> Option<ArticleRecord> {
    let document = Html::parse_document(html);

    let (image_url, photographer) = extract_image_info(&document);

    // UDN's headline selector is stable enough to carry no fallback.
    let title =
        extract::select_first_text(&document, &["h1.article-content__title"]).unwrap_or_default();

    let noise =
        extract::parse_selectors(&["script", "style", ".inline-ad", ".article-content__info"]);
    let body_selector = Selector::parse("section.article-content__editor").unwrap();
    let clean_text = document
        .select(&body_selector)
        .next()
        .map(|node| extract::text_without(node, &noise))
        .unwrap_or_default();

    let time_text = extract::select_first_text(&document, &["time.article-content__time"]);
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
        imageUrl: image_url,
        imagePhotographer: photographer,
    })
}

fn extract_image_info(document: &Html) -> (Option<String>, Option<String>) {
    let image_url = extract::meta_content(document, r#"meta[property="og:image"]"#)
        .or_else(|| extract::jsonld_image(document, true));

    // Cover image alt first, figcaption second.
    let mut photographer = None;
    for raw in [
        ".article-content__cover img",
        "section.article-content__editor img",
    ] {
        let selector = Selector::parse(raw).unwrap();
        if let Some(img) = document.select(&selector).next() {
            photographer = img.value().attr("alt").and_then(udn_credit);
            break;
        }
    }

    if photographer.is_none() {
        if let Some(caption) = extract::select_first_text(
            document,
            &[
                ".article-content__cover figcaption",
                "section.article-content__editor figcaption",
            ],
        ) {
            photographer = udn_credit(&caption);
        }
    }

    (image_url, photographer)
}

/// Byline patterns first, then the trailing wire-agency heuristic common
/// in UDN captions.
fn udn_credit(text: &str) -> Option<String> {
    extract::byline_credit(text).or_else(|| extract::trailing_agency(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_listing_urls_canonicalizes() {
        let html = r#"
            <div class="story-list__text">
                <h2><a href="/news/story/6656/123?from=udn-catebreaknews_ch2">標題一</a></h2>
            </div>
            <div class="story-list__text">
                <h2><a href="/news/story/7321/456#top/">標題二</a></h2>
            </div>
        "#;
        assert_eq!(
            collect_listing_urls(html),
            vec![
                "https://udn.com/news/story/6656/123".to_string(),
                "https://udn.com/news/story/7321/456".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_article_full_page() {
        let html = r#"
            <meta property="og:image" content="https://pgw.udn.com.tw/gw/photo.php?u=a.jpg">
            <h1 class="article-content__title">外交部回應國際情勢</h1>
            <time class="article-content__time">2026-01-10 14:30</time>
            <div class="article-content__cover">
                <img src="a.jpg" alt="外交部大樓。記者李四攝">
            </div>
            <section class="article-content__editor">
                <p>內文第一段。</p>
                <div class="inline-ad">廣告</div>
                <div class="article-content__info">版權說明</div>
                <p>內文第二段。</p>
            </section>
        "#;
        let record = parse_article("https://udn.com/news/story/6656/123", html).unwrap();
        assert_eq!(record.title, "外交部回應國際情勢");
        assert_eq!(record.publishedAt, "2026-01-10 14:30:00");
        assert_eq!(record.cleanText, "內文第一段。\n內文第二段。");
        assert_eq!(record.imagePhotographer.as_deref(), Some("李四"));
        assert!(record.imageUrl.is_some());
        assert!(record.rawHtml.is_empty());
    }

    #[test]
    fn test_parse_article_title_has_no_fallback() {
        let html = r#"
            <h1>一般 h1 不算標題</h1>
            <section class="article-content__editor"><p>內文</p></section>
        "#;
        let record = parse_article("https://udn.com/news/story/6656/124", html).unwrap();
        assert!(record.title.is_empty());
        assert!(!record.has_required_fields());
    }

    #[test]
    fn test_udn_credit_trailing_agency() {
        assert_eq!(udn_credit("示意圖。路透"), Some("路透".to_string()));
        assert_eq!(udn_credit("記者李四攝"), Some("李四".to_string()));
        assert_eq!(udn_credit("單純的圖片說明"), None);
    }

    #[test]
    fn test_extract_image_info_jsonld_prefers_content_url() {
        let document = Html::parse_document(
            r#"<script type="application/ld+json">
                {"image": {"url": "https://u.example.com/u.jpg", "contentUrl": "https://u.example.com/c.jpg"}}
            </script>"#,
        );
        let (image_url, _) = extract_image_info(&document);
        assert_eq!(image_url.as_deref(), Some("https://u.example.com/c.jpg"));
    }

    #[test]
    fn test_extract_image_info_figcaption_fallback() {
        let document = Html::parse_document(
            r#"
            <div class="article-content__cover">
                <figcaption>記者王五攝</figcaption>
            </div>
            "#,
        );
        let (_, photographer) = extract_image_info(&document);
        assert_eq!(photographer.as_deref(), Some("王五"));
    }
}
