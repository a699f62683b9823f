//! Best-effort markup scraping for page titles and favicons.
//!
//! This is deliberately not an HTML parser: it scans for a handful of tag
//! patterns and tolerates truncated or malformed documents.

use super::page_url::PageTarget;
use once_cell::sync::Lazy;
use regex::Regex;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title pattern"));

static LINK_REL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link[^>]+rel=["']?([^"'>]+)["']?[^>]*>"#).expect("valid link pattern")
});

static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href=["']?([^"'>\s]+)["']?"#).expect("valid href pattern"));

static ICON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)icon").expect("valid icon pattern"));

static ABSOLUTE_HTTP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("valid scheme pattern"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Text of the first `<title>` element, trimmed and whitespace-collapsed.
/// Returns `None` when there is no title or it is blank.
pub fn extract_title(html: &str) -> Option<String> {
    let inner = TITLE_RE.captures(html)?.get(1)?.as_str();
    let title = collapse_whitespace(inner);
    (!title.is_empty()).then_some(title)
}

/// `href` of the first `<link>` whose `rel` mentions "icon".
///
/// Matches `icon`, `shortcut icon`, `apple-touch-icon` and so on. Links with
/// an icon rel but no usable `href` are skipped.
pub fn extract_favicon_href(html: &str) -> Option<&str> {
    LINK_REL_RE
        .captures_iter(html)
        .filter(|caps| caps.get(1).is_some_and(|rel| ICON_RE.is_match(rel.as_str())))
        .find_map(|caps| {
            let tag = caps.get(0)?.as_str();
            HREF_RE.captures(tag)?.get(1).map(|href| href.as_str())
        })
}

/// Makes a favicon href absolute against the page origin.
///
/// Resolution is root-relative only: `icon.png` on `https://a.com/dir/page`
/// becomes `https://a.com/icon.png`, not `https://a.com/dir/icon.png`.
/// Protocol-relative `//cdn/x.ico` is treated the same way.
pub fn resolve_favicon(href: &str, target: &PageTarget) -> String {
    if ABSOLUTE_HTTP_RE.is_match(href) {
        return href.to_string();
    }

    let origin = target.origin();
    if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}

/// Trims and replaces every whitespace run with a single space.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}
