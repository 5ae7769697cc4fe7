//! Wire types for the remote ingestion API.
//!
//! The ingest backend expects camelCase JSON field names, hence the
//! `#[allow(non_snake_case)]` attributes: the field names are the schema.

use serde::{Deserialize, Serialize};

/// One extracted article, ready to be posted to `POST {base}/articles`.
///
/// The record is built fresh per fetch, never mutated, and discarded after
/// one ingestion attempt. `url` is the identity the dedup check runs on;
/// the ingest backend rejects records with an empty `title` or `cleanText`,
/// so the pipeline filters those out before posting.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Publisher short code ("CNA", "CTI", "LTN", "SET", "UDN").
    pub source: String,
    /// Canonicalized article URL.
    pub url: String,
    /// Extracted headline.
    pub title: String,
    /// Best-effort publication timestamp. Falls back to wall-clock "now"
    /// when the page carries nothing parseable.
    pub publishedAt: String,
    /// Full page HTML for LTN and CTI; empty string for the other sites.
    pub rawHtml: String,
    /// Extracted body text.
    pub cleanText: String,
    /// Primary image URL, when the site exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imageUrl: Option<String>,
    /// Photographer or agency credit pulled out of captions/alt text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagePhotographer: Option<String>,
}

impl ArticleRecord {
    /// The ingest backend only accepts records with both a title and body.
    pub fn has_required_fields(&self) -> bool {
        !self.title.is_empty() && !self.cleanText.is_empty()
    }
}

/// Request body for `POST {base}/check-urls`.
#[allow(non_snake_case)]
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckUrlsRequest {
    pub sourceCode: String,
    pub urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ArticleRecord {
        ArticleRecord {
            source: "CNA".to_string(),
            url: "https://www.cna.com.tw/news/aipl/202501010001.aspx".to_string(),
            title: "測試標題".to_string(),
            publishedAt: "2025-01-01 08:30:00".to_string(),
            rawHtml: String::new(),
            cleanText: "內文".to_string(),
            imageUrl: None,
            imagePhotographer: None,
        }
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains("\"publishedAt\""));
        assert!(json.contains("\"cleanText\""));
        assert!(json.contains("\"rawHtml\""));
    }

    #[test]
    fn test_optional_image_fields_omitted_when_absent() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(!json.contains("imageUrl"));
        assert!(!json.contains("imagePhotographer"));
    }

    #[test]
    fn test_optional_image_fields_present_when_set() {
        let mut rec = record();
        rec.imageUrl = Some("https://img.example.com/a.jpg".to_string());
        rec.imagePhotographer = Some("王小明".to_string());
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"imageUrl\""));
        assert!(json.contains("\"imagePhotographer\""));
    }

    #[test]
    fn test_has_required_fields() {
        assert!(record().has_required_fields());

        let mut no_title = record();
        no_title.title.clear();
        assert!(!no_title.has_required_fields());

        let mut no_body = record();
        no_body.cleanText.clear();
        assert!(!no_body.has_required_fields());
    }

    #[test]
    fn test_check_urls_request_shape() {
        let req = CheckUrlsRequest {
            sourceCode: "UDN".to_string(),
            urls: vec!["https://udn.com/news/story/1/2".to_string()],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"sourceCode\":\"UDN\""));
        assert!(json.contains("\"urls\""));
    }
}
