//! Pattern-based HTML cleanup.
//!
//! This is a best-effort filter for display, not a security boundary: it
//! matches tags with regular expressions and does not parse HTML.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Markup substituted for every `<img>` tag while images are blocked.
pub const BLOCKED_IMAGE_PLACEHOLDER: &str =
    r#"<span class="blocked-image" title="Image blocked">[image blocked]</span>"#;

fn script_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script regex")
    })
}

fn event_handler_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("valid event handler regex")
    })
}

fn open_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<[a-zA-Z][^>]*>").expect("valid open tag regex"))
}

fn image_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid image regex"))
}

fn tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"))
}

fn style_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid style regex")
    })
}

/// Strip `<script>` blocks and inline `on*` event attributes.
///
/// Attributes are only removed inside opening tags; text is left alone.
pub fn sanitize_html(html: &str) -> String {
    let without_scripts = script_regex().replace_all(html, "");
    open_tag_regex()
        .replace_all(&without_scripts, |caps: &Captures| {
            event_handler_regex().replace_all(&caps[0], "").into_owned()
        })
        .into_owned()
}

/// Replace every `<img>` tag with [`BLOCKED_IMAGE_PLACEHOLDER`].
pub fn block_images(html: &str) -> String {
    image_regex()
        .replace_all(html, BLOCKED_IMAGE_PLACEHOLDER)
        .into_owned()
}

/// Reduce markup to its visible text with collapsed whitespace.
pub fn html_to_text(html: &str) -> String {
    let without_scripts = script_regex().replace_all(html, " ");
    let without_styles = style_regex().replace_all(&without_scripts, " ");
    let without_tags = tag_regex().replace_all(&without_styles, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
