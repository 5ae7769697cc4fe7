//! Shared HTML field-extraction helpers.
//!
//! Every site crawler works the same way: an ordered cascade of selector
//! attempts per field, tried in sequence until one yields a non-empty
//! result. The helpers here implement the cascade, noise-free body text
//! extraction, the JSON-LD image lookup, the photographer-credit regexes,
//! and the permissive timestamp parser. Site-specific selector tables live
//! in the per-site modules.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Concatenated, whitespace-trimmed text of one element.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

/// Try each selector in order; return the first non-empty element text.
pub fn select_first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let selector = Selector::parse(raw).unwrap();
        if let Some(el) = document.select(&selector).next() {
            let text = element_text(el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Read the `content` attribute of the first element matching `selector`.
pub fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

/// Parse a list of selector literals. Panics on a malformed literal, which
/// is a programming error in a site's selector table.
pub fn parse_selectors(raw: &[&str]) -> Vec<Selector> {
    raw.iter().map(|s| Selector::parse(s).unwrap()).collect()
}

/// Text of `root` with every subtree matching one of the `noise`
/// selectors dropped, text nodes trimmed and joined with newlines. This is
/// the equivalent of decomposing ad/script/related-content blocks before
/// reading the container text.
pub fn text_without(root: ElementRef<'_>, noise: &[Selector]) -> String {
    let mut parts = Vec::new();
    collect_text(root, noise, &mut parts);
    parts.join("\n")
}

fn collect_text(el: ElementRef<'_>, noise: &[Selector], out: &mut Vec<String>) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if noise.iter().any(|sel| sel.matches(&child_el)) {
                continue;
            }
            collect_text(child_el, noise, out);
        } else if let Node::Text(text) = child.value() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
    }
}

/// Paragraph-level extraction: the text of each `<p>` under `root` that is
/// not inside a noise subtree and does not contain any of the banned line
/// phrases, joined with newlines. Returns `None` when the container has no
/// paragraphs at all, so the caller can fall back to whole-container text.
pub fn paragraph_text(
    root: ElementRef<'_>,
    noise: &[Selector],
    banned_phrases: &[&str],
) -> Option<String> {
    let p_selector = Selector::parse("p").unwrap();
    let paragraphs: Vec<ElementRef<'_>> = root
        .select(&p_selector)
        .filter(|p| !inside_noise(p, &root, noise))
        .collect();
    if paragraphs.is_empty() {
        return None;
    }
    let texts: Vec<String> = paragraphs
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty() && !banned_phrases.iter().any(|phrase| t.contains(phrase)))
        .collect();
    Some(texts.join("\n"))
}

fn inside_noise(el: &ElementRef<'_>, root: &ElementRef<'_>, noise: &[Selector]) -> bool {
    for ancestor in el.ancestors() {
        if ancestor.id() == root.id() {
            break;
        }
        if let Some(ancestor_el) = ElementRef::wrap(ancestor) {
            if noise.iter().any(|sel| sel.matches(&ancestor_el)) {
                return true;
            }
        }
    }
    false
}

/// First image URL found in a JSON-LD block. Handles the string, object,
/// and array forms of the `image` property; UDN's markup tends to carry
/// `contentUrl`, SET's `url`, hence the preference flag.
pub fn jsonld_image(document: &Html, prefer_content_url: bool) -> Option<String> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw.trim()) else {
            continue;
        };
        if let Some(url) = value.get("image").and_then(|img| image_url_from(img, prefer_content_url)) {
            return Some(url);
        }
    }
    None
}

fn image_url_from(image: &serde_json::Value, prefer_content_url: bool) -> Option<String> {
    use serde_json::Value;
    match image {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => image_object_url(image, prefer_content_url),
        Value::Array(items) => items.first().and_then(|first| match first {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => image_object_url(first, prefer_content_url),
            _ => None,
        }),
        _ => None,
    }
}

fn image_object_url(obj: &serde_json::Value, prefer_content_url: bool) -> Option<String> {
    let (first, second) = if prefer_content_url {
        ("contentUrl", "url")
    } else {
        ("url", "contentUrl")
    };
    obj.get(first)
        .and_then(|v| v.as_str())
        .or_else(|| obj.get(second).and_then(|v| v.as_str()))
        .map(str::to_string)
}

// Photographer-credit patterns, matched against captions and alt text.
// Heuristic and publisher-specific; false positives are accepted.
static REPORTER_SHOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"記者(.+?)攝").unwrap());
static IMAGE_PROVIDED: Lazy<Regex> = Lazy::new(|| Regex::new(r"圖／(.+?)提供").unwrap());
static PHOTO_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"攝影[：:]\s*(.+?)(?:\s|$|）|】)").unwrap());
static TRAILING_AGENCY: Lazy<Regex> = Lazy::new(|| Regex::new(r"。([^\s。（）]{1,10})$").unwrap());

fn first_capture(text: &str, patterns: &[&Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].trim().to_string());
        }
    }
    None
}

/// Photographer credit as SET captions carry it: reporter byline, image
/// courtesy line, or an explicit 攝影 label. First pattern that matches
/// wins.
pub fn photographer_credit(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    first_capture(text, &[&REPORTER_SHOT, &IMAGE_PROVIDED, &PHOTO_BY])
}

/// Reporter byline and 攝影 label only; UDN captions do not use the
/// courtesy-line form.
pub fn byline_credit(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    first_capture(text, &[&REPORTER_SHOT, &PHOTO_BY])
}

/// UDN caption endings often name a wire agency after the final full stop
/// ("…。路透"). Anything longer than 8 characters is assumed to be prose
/// rather than an agency name.
pub fn trailing_agency(text: &str) -> Option<String> {
    let caps = TRAILING_AGENCY.captures(text.trim())?;
    let agency = caps[1].trim().to_string();
    if !agency.is_empty() && agency.chars().count() <= 8 {
        Some(agency)
    } else {
        None
    }
}

/// Permissive timestamp parsing: RFC 3339 first, then the date layouts the
/// five sites actually render.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    const DATETIME_LAYOUTS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y年%m月%d日 %H:%M",
    ];
    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(dt);
        }
    }
    const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
    for layout in DATE_LAYOUTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse `raw` when present, otherwise (or on parse failure) substitute
/// current wall-clock time. Downstream cannot tell "unknown" from "just
/// published"; that limitation is inherited and kept.
pub fn timestamp_or_now(raw: Option<&str>) -> NaiveDateTime {
    raw.and_then(parse_datetime)
        .unwrap_or_else(|| Local::now().naive_local())
}
