//! HTML sanitization for entry content and summary.
//!
//! The fragment is parsed into a DOM and re-serialized keeping only an
//! allowlist of elements and attributes. While serializing, links are made
//! to open in a new window and images are rewritten for lazy loading.

use scraper::{ElementRef, Html, Node};

/// Image shown in place of entry images until they are lazy-loaded.
pub const IMAGE_PLACEHOLDER: &str = "/images/Ajax-loader.gif";

/// Elements kept in sanitized markup.
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "cite", "code", "dd", "div", "dl", "dt", "em",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "li", "ol", "p",
    "pre", "q", "s", "small", "span", "strong", "sub", "sup", "table", "tbody", "td", "th",
    "thead", "tr", "u", "ul",
];

/// Elements dropped together with everything inside them.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "form", "template", "head",
    "title", "svg", "math",
];

/// Elements without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img"];

/// Sanitize an HTML fragment.
///
/// Unknown elements are unwrapped (their children are kept), comments are
/// removed and the result is trimmed. If nothing but text survives, the text
/// is wrapped in a paragraph.
pub fn sanitize_html(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut serializer = Serializer::default();
    serializer.children(fragment.root_element());

    let html = serializer.out.trim();
    if html.is_empty() {
        String::new()
    } else if serializer.emitted_element {
        html.to_string()
    } else {
        format!("<p>{html}</p>")
    }
}

#[derive(Default)]
struct Serializer {
    out: String,
    emitted_element: bool,
}

impl Serializer {
    fn children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => escape_text(text, &mut self.out),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                // Comments, doctypes and processing instructions
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if DROPPED_TAGS.contains(&name) {
            return;
        }
        if !ALLOWED_TAGS.contains(&name) {
            self.children(element);
            return;
        }

        let attrs = match name {
            "a" => anchor_attributes(element),
            "img" => match image_attributes(element) {
                Some(attrs) => attrs,
                None => return,
            },
            _ => Vec::new(),
        };

        self.emitted_element = true;
        self.out.push('<');
        self.out.push_str(name);
        for (attr, value) in &attrs {
            self.out.push(' ');
            self.out.push_str(attr);
            self.out.push_str("=\"");
            escape_attribute(value, &mut self.out);
            self.out.push('"');
        }
        self.out.push('>');

        if VOID_TAGS.contains(&name) {
            return;
        }

        self.children(element);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }
}

/// `href` and `title` of a link, which always opens in a new window.
fn anchor_attributes(element: ElementRef<'_>) -> Vec<(&'static str, String)> {
    let el = element.value();
    let mut attrs = Vec::with_capacity(3);
    if let Some(href) = el.attr("href").map(str::trim).filter(|h| is_safe_url(h)) {
        attrs.push(("href", href.to_string()));
    }
    if let Some(title) = el.attr("title") {
        attrs.push(("title", title.to_string()));
    }
    attrs.push(("target", "_blank".to_string()));
    attrs
}

/// `alt`, placeholder `src` and the original source as `data-src`.
///
/// An image that was already rewritten keeps its `data-src`. Images without
/// a usable source are dropped.
fn image_attributes(element: ElementRef<'_>) -> Option<Vec<(&'static str, String)>> {
    let el = element.value();
    let source = el
        .attr("data-src")
        .or_else(|| el.attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty() && *src != IMAGE_PLACEHOLDER && is_safe_url(src))?;

    let mut attrs = Vec::with_capacity(3);
    if let Some(alt) = el.attr("alt") {
        attrs.push(("alt", alt.to_string()));
    }
    attrs.push(("src", IMAGE_PLACEHOLDER.to_string()));
    attrs.push(("data-src", source.to_string()));
    Some(attrs)
}

/// Relative references and http, https or mailto URLs.
fn is_safe_url(url: &str) -> bool {
    let scheme_end = url.find(':');
    let path_start = url.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => true,
        (Some(colon), _) => {
            let scheme = url[..colon].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        (None, _) => true,
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_removed() {
        assert_eq!(
            sanitize_html(r#"<script>alert("pwned!");</script>content"#),
            "<p>content</p>"
        );
    }

    #[test]
    fn test_plain_text_is_wrapped_in_paragraph() {
        assert_eq!(sanitize_html("content"), "<p>content</p>");
    }

    #[test]
    fn test_markup_is_trimmed_and_not_wrapped() {
        assert_eq!(sanitize_html("\n    <p>summary</p>"), "<p>summary</p>");
    }

    #[test]
    fn test_links_open_in_new_window() {
        assert_eq!(
            sanitize_html(r#"<a href="http://some.link">Click here to read full story</a>"#),
            r#"<a href="http://some.link" target="_blank">Click here to read full story</a>"#
        );
    }

    #[test]
    fn test_existing_target_is_replaced() {
        assert_eq!(
            sanitize_html(r#"<a href="http://some.link" target="_self" onclick="x()">y</a>"#),
            r#"<a href="http://some.link" target="_blank">y</a>"#
        );
    }

    #[test]
    fn test_javascript_links_lose_href() {
        assert_eq!(
            sanitize_html(r#"<a href="javascript:alert(1)">y</a>"#),
            r#"<a target="_blank">y</a>"#
        );
    }

    #[test]
    fn test_images_are_lazy_loaded() {
        let html = r#"<img alt="20131029" class="size-full wp-image-6860" height="600" src="http://www.leasticoulddo.com/wp-content/uploads/2013/10/20131029.gif" title="20131029" width="1024">"#;
        assert_eq!(
            sanitize_html(html),
            r#"<img alt="20131029" src="/images/Ajax-loader.gif" data-src="http://www.leasticoulddo.com/wp-content/uploads/2013/10/20131029.gif">"#
        );
    }

    #[test]
    fn test_rewritten_image_keeps_original_source() {
        let html = r#"<img src="/images/Ajax-loader.gif" data-src="http://a.b/c.gif">"#;
        assert_eq!(sanitize_html(html), html);
    }

    #[test]
    fn test_image_without_source_is_dropped() {
        assert_eq!(sanitize_html(r#"<p><img alt="x">text</p>"#), "<p>text</p>");
        assert_eq!(
            sanitize_html(r#"<p><img src="data:image/png;base64,AAAA">text</p>"#),
            "<p>text</p>"
        );
    }

    #[test]
    fn test_comments_are_removed() {
        assert_eq!(
            sanitize_html("<p><!--This is a comment-->This is some text</p>"),
            "<p>This is some text</p>"
        );
    }

    #[test]
    fn test_unknown_elements_are_unwrapped() {
        assert_eq!(
            sanitize_html(r#"<p><font color="red">red</font> text</p>"#),
            "<p>red text</p>"
        );
    }

    #[test]
    fn test_attributes_are_stripped() {
        assert_eq!(
            sanitize_html(r#"<p style="color:red" onclick="x()">text</p>"#),
            "<p>text</p>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(sanitize_html("a &lt; b &amp; c"), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_attribute_is_escaped() {
        assert_eq!(
            sanitize_html(r#"<a href="http://x.com/?a=1&amp;b=2" title="&quot;q&quot;">x</a>"#),
            r#"<a href="http://x.com/?a=1&amp;b=2" title="&quot;q&quot;" target="_blank">x</a>"#
        );
    }

    #[test]
    fn test_void_elements() {
        assert_eq!(sanitize_html("line<br>next<hr>"), "line<br>next<hr>");
    }

    #[test]
    fn test_only_dropped_content_is_empty() {
        assert_eq!(sanitize_html("<script>x</script>  "), "");
        assert_eq!(sanitize_html(""), "");
    }

    #[test]
    fn test_is_safe_url() {
        assert!(is_safe_url("http://x.com"));
        assert!(is_safe_url("HTTPS://x.com"));
        assert!(is_safe_url("mailto:a@b.c"));
        assert!(is_safe_url("/relative/path"));
        assert!(is_safe_url("page.html?x=a:b"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("data:text/html,x"));
    }
}
