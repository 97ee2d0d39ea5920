//! Entry field normalization.
//!
//! Every field is coerced to UTF-8, sanitized and trimmed before an entry is
//! validated and saved. Plain-text fields keep only their text content;
//! `content` and `summary` keep a safe HTML subset (see [`super::markup`]).

use chrono::{DateTime, Utc};
use encoding_rs::WINDOWS_1252;
use scraper::{ElementRef, Html, Node};
use url::Url;

use super::markup::sanitize_html;
use super::types::NewEntry;

/// Entry fields after normalization, ready for validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    /// Unique id within the feed.
    pub guid: String,
    /// Absolute article URL.
    pub url: String,
    /// Plain-text title.
    pub title: String,
    /// Plain-text author.
    pub author: Option<String>,
    /// Sanitized content markup.
    pub content: Option<String>,
    /// Sanitized summary markup.
    pub summary: Option<String>,
    /// Publication time.
    pub published: DateTime<Utc>,
}

/// Normalize the fields of an entry.
///
/// `base_url` is the feed's site URL, or its fetch URL when the site URL is
/// unknown; relative entry URLs are resolved against it.
pub fn normalize_entry(entry: &NewEntry, base_url: Option<&str>) -> NormalizedEntry {
    let guid = entry.guid.as_deref().map(plain_text).unwrap_or_default();
    let raw_url = entry
        .url
        .as_deref()
        .map(|bytes| encode_non_ascii(&plain_text(bytes)))
        .unwrap_or_default();

    let mut url = resolve_url(&raw_url, base_url);
    if !is_http_url(&url) && is_http_url(&guid) {
        url = guid.clone();
    }

    let guid = if guid.is_empty() { url.clone() } else { guid };
    let title = match entry.title.as_deref().map(plain_text) {
        Some(title) if !title.is_empty() => title,
        _ => url.clone(),
    };

    NormalizedEntry {
        guid,
        url,
        title,
        author: entry.author.as_deref().map(plain_text).filter(|s| !s.is_empty()),
        content: entry.content.as_deref().map(rich_text).filter(|s| !s.is_empty()),
        summary: entry.summary.as_deref().map(rich_text).filter(|s| !s.is_empty()),
        published: entry.published.unwrap_or_else(Utc::now),
    }
}

/// Decode bytes as UTF-8, falling back to windows-1252 when they are not
/// valid UTF-8.
pub fn to_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

/// Coerce, strip all markup from and trim a plain-text field.
pub fn plain_text(bytes: &[u8]) -> String {
    strip_markup(&to_utf8(bytes)).trim().to_string()
}

/// Coerce, sanitize and trim a markup field.
pub fn rich_text(bytes: &[u8]) -> String {
    sanitize_html(&to_utf8(bytes))
}

/// Keep only the text content of an HTML fragment.
///
/// The contents of `script` and `style` elements are dropped and entities
/// are decoded.
pub fn strip_markup(input: &str) -> String {
    if !input.contains(['<', '&']) {
        return input.to_string();
    }

    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    collect_text(fragment.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if matches!(el.name(), "script" | "style") => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Percent-encode every non-ASCII character as its UTF-8 bytes.
pub fn encode_non_ascii(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut buf = [0u8; 4];
    for c in input.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    out
}

/// Whether the string is an absolute http(s) URL with a host.
pub fn is_http_url(s: &str) -> bool {
    Url::parse(s).is_ok_and(|u| {
        matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty())
    })
}

/// Resolve a possibly relative URL against the feed's base URL.
///
/// Absolute URLs are returned unchanged (not re-serialized). Strings
/// containing whitespace are never treated as relative references.
pub fn resolve_url(url: &str, base_url: Option<&str>) -> String {
    if url.is_empty() || is_http_url(url) || url.contains(char::is_whitespace) {
        return url.to_string();
    }

    base_url
        .and_then(|base| Url::parse(base).ok())
        .and_then(|base| base.join(url).ok())
        .map(|joined| joined.to_string())
        .filter(|joined| is_http_url(joined))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_URL: &str = "http://feed.server.com";

    fn normalize(entry: NewEntry) -> NormalizedEntry {
        normalize_entry(&entry, Some(FEED_URL))
    }

    fn entry() -> NewEntry {
        NewEntry::new(1)
            .with_guid("some_guid")
            .with_url("http://some.link")
            .with_title("Some title")
    }

    #[test]
    fn test_to_utf8_passes_valid_utf8() {
        assert_eq!(to_utf8("è title".as_bytes()), "è title");
    }

    #[test]
    fn test_to_utf8_converts_latin1() {
        assert_eq!(to_utf8(b"\xE8 title"), "è title");
    }

    #[test]
    fn test_title_is_converted_to_utf8() {
        let normalized = normalize(entry().with_title(b"\xE8 title"));
        assert_eq!(normalized.title, "è title");
    }

    #[test]
    fn test_author_is_converted_to_utf8() {
        let normalized = normalize(entry().with_author(b"\xE8 author"));
        assert_eq!(normalized.author.as_deref(), Some("è author"));
    }

    #[test]
    fn test_content_and_summary_are_converted_to_utf8() {
        let normalized = normalize(
            entry()
                .with_content(b"\xE8 content")
                .with_summary(b"\xE8 summary"),
        );
        assert_eq!(normalized.content.as_deref(), Some("<p>è content</p>"));
        assert_eq!(normalized.summary.as_deref(), Some("<p>è summary</p>"));
    }

    #[test]
    fn test_guid_is_converted_to_utf8() {
        let normalized = normalize(entry().with_guid(b"\xE8 guid"));
        assert_eq!(normalized.guid, "è guid");
    }

    #[test]
    fn test_url_non_ascii_is_percent_encoded() {
        let normalized = normalize(entry().with_url(b"http://xkcd.com/\xE8"));
        assert_eq!(normalized.url, "http://xkcd.com/%C3%A8");

        let normalized = normalize(entry().with_url("http://xkcd.com/è"));
        assert_eq!(normalized.url, "http://xkcd.com/%C3%A8");
    }

    #[test]
    fn test_title_is_sanitized() {
        let normalized = normalize(entry().with_title(r#"<script>alert("pwned!");</script>title"#));
        assert_eq!(normalized.title, "title");
    }

    #[test]
    fn test_url_is_sanitized() {
        let normalized =
            normalize(entry().with_url(r#"http://xkcd.com<script>alert("pwned!");</script>"#));
        assert_eq!(normalized.url, "http://xkcd.com");
    }

    #[test]
    fn test_author_and_guid_are_sanitized() {
        let normalized = normalize(
            entry()
                .with_author(r#"<script>alert("pwned!");</script>author"#)
                .with_guid(r#"<script>alert("pwned!");</script>guid"#),
        );
        assert_eq!(normalized.author.as_deref(), Some("author"));
        assert_eq!(normalized.guid, "guid");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let normalized = normalize(
            NewEntry::new(1)
                .with_guid("  some_guid \n")
                .with_url("\n  http://some.link  ")
                .with_title("\t Some title ")
                .with_author("  author ")
                .with_summary("\n    <p>summary</p>"),
        );
        assert_eq!(normalized.guid, "some_guid");
        assert_eq!(normalized.url, "http://some.link");
        assert_eq!(normalized.title, "Some title");
        assert_eq!(normalized.author.as_deref(), Some("author"));
        assert_eq!(normalized.summary.as_deref(), Some("<p>summary</p>"));
    }

    #[test]
    fn test_absolute_url_is_not_reserialized() {
        let normalized = normalize(entry().with_url("http://xkcd.com"));
        assert_eq!(normalized.url, "http://xkcd.com");
    }

    #[test]
    fn test_relative_url_is_resolved_against_feed() {
        let normalized = normalize(entry().with_url("/entry.html"));
        assert_eq!(normalized.url, "http://feed.server.com/entry.html");
    }

    #[test]
    fn test_invalid_url_falls_back_to_guid() {
        let normalized = normalize(
            entry()
                .with_url("not a valid url")
                .with_guid("http://guid.is.a.url.com"),
        );
        assert_eq!(normalized.url, "http://guid.is.a.url.com");
    }

    #[test]
    fn test_guid_defaults_to_url() {
        let normalized = normalize(NewEntry::new(1).with_url("http://some.link"));
        assert_eq!(normalized.guid, "http://some.link");

        let normalized = normalize(NewEntry::new(1).with_url("http://some.link").with_guid("  "));
        assert_eq!(normalized.guid, "http://some.link");
    }

    #[test]
    fn test_title_defaults_to_url() {
        let normalized = normalize(NewEntry::new(1).with_url("http://some.link"));
        assert_eq!(normalized.title, "http://some.link");

        let normalized = normalize(
            NewEntry::new(1)
                .with_url("http://some.link")
                .with_title("<script>x</script>"),
        );
        assert_eq!(normalized.title, "http://some.link");
    }

    #[test]
    fn test_published_defaults_to_now() {
        let before = Utc::now();
        let normalized = normalize(entry());
        assert!(normalized.published >= before);
        assert!(normalized.published <= Utc::now());
    }

    #[test]
    fn test_published_is_kept() {
        let published = DateTime::parse_from_rfc3339("2013-10-29T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let normalized = normalize(entry().with_published(published));
        assert_eq!(normalized.published, published);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize(
            entry()
                .with_title(b"\xE8 <b>title</b>")
                .with_url("/entry.html")
                .with_content(r#"<a href="http://some.link">x</a><img src="http://a.b/c.gif">"#),
        );
        let again = normalize(NewEntry::from_normalized(1, &once));
        assert_eq!(once, again);
    }

    #[test]
    fn test_strip_markup_decodes_entities() {
        assert_eq!(strip_markup("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(strip_markup("a < b"), "a < b");
        assert_eq!(strip_markup("<style>p{}</style><b>bold</b>"), "bold");
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("http://xkcd.com"));
        assert!(is_http_url("https://xkcd.com/1/"));
        assert!(!is_http_url("ftp://xkcd.com"));
        assert!(!is_http_url("not a valid url"));
        assert!(!is_http_url("/entry.html"));
        assert!(!is_http_url(""));
    }

    #[test]
    fn test_resolve_url_without_base() {
        assert_eq!(resolve_url("/entry.html", None), "/entry.html");
    }
}
