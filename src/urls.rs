//! URL normalization for hrefs scraped off listing pages.
//!
//! Each site applies a slightly different combination of these helpers;
//! the common rules are: make the URL absolute, strip tracking query
//! strings and fragments, drop trailing slashes, and undo the occasional
//! double-prefix artifact produced by naive string concatenation.

/// Prefix a relative href with the site origin. Absolute hrefs pass
/// through untouched.
pub fn absolutize(origin: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", origin, href)
    }
}

/// Strip the query string only; CNA keeps fragments and trailing slashes
/// as they appear on the listing page.
pub fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

/// Strip query string, fragment, and trailing slash.
///
/// Idempotent: canonicalizing an already-canonical URL is a no-op.
pub fn canonicalize(url: &str) -> String {
    let no_query = url.split('?').next().unwrap_or(url);
    let no_fragment = no_query.split('#').next().unwrap_or(no_query);
    no_fragment.trim_end_matches('/').to_string()
}

/// Repair `{origin}https://…` artifacts from joining an already-absolute
/// href onto the origin.
pub fn repair_double_prefix(url: &str, origin: &str) -> String {
    let doubled = format!("{}https://", origin);
    if url.contains(&doubled) {
        url.replace(&doubled, "https://")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_relative() {
        assert_eq!(
            absolutize("https://www.cna.com.tw", "/news/aipl/1.aspx"),
            "https://www.cna.com.tw/news/aipl/1.aspx"
        );
    }

    #[test]
    fn test_absolutize_keeps_absolute() {
        assert_eq!(
            absolutize("https://www.cna.com.tw", "https://www.cna.com.tw/news/aipl/1.aspx"),
            "https://www.cna.com.tw/news/aipl/1.aspx"
        );
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("https://www.cna.com.tw/news/aipl/1.aspx?utm=feed"),
            "https://www.cna.com.tw/news/aipl/1.aspx"
        );
        assert_eq!(
            strip_query("https://www.cna.com.tw/news/aipl/1.aspx"),
            "https://www.cna.com.tw/news/aipl/1.aspx"
        );
    }

    #[test]
    fn test_canonicalize_strips_query_fragment_slash() {
        assert_eq!(
            canonicalize("https://udn.com/news/story/6656/123?from=udn-catebreaknews_ch2#top/"),
            "https://udn.com/news/story/6656/123"
        );
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let urls = [
            "https://udn.com/news/story/6656/123?from=x#y/",
            "https://news.ltn.com.tw/news/politics/breakingnews/1",
            "https://www.setn.com/News.aspx",
        ];
        for url in urls {
            let once = canonicalize(url);
            assert_eq!(canonicalize(&once), once);
        }
    }

    #[test]
    fn test_repair_double_prefix() {
        assert_eq!(
            repair_double_prefix(
                "https://www.setn.comhttps://www.setn.com/News.aspx?NewsID=1",
                "https://www.setn.com"
            ),
            "https://www.setn.com/News.aspx?NewsID=1"
        );
    }

    #[test]
    fn test_repair_double_prefix_noop_on_clean_url() {
        let url = "https://www.setn.com/News.aspx?NewsID=1";
        assert_eq!(repair_double_prefix(url, "https://www.setn.com"), url);
    }
}
