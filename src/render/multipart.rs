//! Sub-part extraction from raw multipart payloads.

use std::sync::OnceLock;

use regex::Regex;

/// Marker identifying a multipart payload.
const MULTIPART_MARKER: &str = "content-type: multipart/";

/// Deepest level of nested multipart containers that is searched.
const MAX_NESTING: usize = 4;

fn html_part_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?is)Content-Type:\s*text/html\b[^\n]*\n(.*?)(?:\r?\n--|\z)")
            .expect("valid html part regex")
    })
}

fn text_part_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?is)Content-Type:\s*text/plain\b[^\n]*\n(.*?)(?:\r?\n--|\z)")
            .expect("valid text part regex")
    })
}

fn multipart_header_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)content-type:\s*multipart/[a-z0-9.+-]+((?:[^\n]|\n[ \t])*)")
            .expect("valid multipart header regex")
    })
}

fn boundary_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\bboundary\s*=\s*(?:"([^"]+)"|([^\s;"]+))"#)
            .expect("valid boundary regex")
    })
}

fn content_type_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?im)^content-type:\s*([a-z0-9.+-]+/[a-z0-9.+-]+)")
            .expect("valid content type regex")
    })
}

/// A displayable sub-part found in a multipart payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// A `text/html` sub-part.
    Html(String),
    /// A `text/plain` sub-part.
    Text(String),
}

/// Check whether a raw payload is multipart.
pub fn is_multipart(body: &str) -> bool {
    body.to_ascii_lowercase().contains(MULTIPART_MARKER)
}

/// Find the preferred sub-part: HTML first, then plain text.
///
/// Parts are delimited by the declared `boundary`. Payloads without one, or
/// whose boundary delimits nothing, fall back to ending a part at the next
/// line starting with `--`.
pub fn extract_part(body: &str) -> Option<Part> {
    let mut found = Vec::new();
    if let Some(boundary) = declared_boundary(body) {
        collect_parts(body, &boundary, 0, &mut found);
    }
    if found.is_empty() {
        return extract_unbounded(body);
    }
    match found.iter().position(|p| matches!(p, Part::Html(_))) {
        Some(idx) => Some(found.swap_remove(idx)),
        None => found.into_iter().next(),
    }
}

fn extract_unbounded(body: &str) -> Option<Part> {
    if let Some(html) = capture(html_part_regex(), body) {
        return Some(Part::Html(html));
    }
    capture(text_part_regex(), body).map(Part::Text)
}

/// Boundary parameter of the first multipart content type in `text`.
fn declared_boundary(text: &str) -> Option<String> {
    let params = multipart_header_regex().captures(text)?.get(1)?.as_str();
    let caps = boundary_regex().captures(params)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Gather the text parts of a multipart body, descending into nested containers.
fn collect_parts(body: &str, boundary: &str, depth: usize, found: &mut Vec<Part>) {
    for part in split_parts(body, boundary) {
        let (headers, content) = split_headers(&part);
        let content_type = content_type_regex()
            .captures(&headers)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| "text/plain".to_string());

        if content_type.starts_with("multipart/") {
            if depth < MAX_NESTING {
                if let Some(inner) = declared_boundary(&headers) {
                    collect_parts(&content, &inner, depth + 1, found);
                }
            }
        } else if content_type == "text/html" {
            found.push(Part::Html(content.trim().to_string()));
        } else if content_type == "text/plain" {
            found.push(Part::Text(content.trim().to_string()));
        }
    }
}

/// Split a multipart body into the raw parts between boundary lines.
///
/// The preamble before the first boundary and the epilogue after the
/// closing boundary are dropped. An unterminated last part is kept.
fn split_parts(body: &str, boundary: &str) -> Vec<String> {
    let delimiter = format!("--{boundary}");
    let close = format!("{delimiter}--");

    let mut parts = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in body.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let marker = line.trim_end();
        if marker == close {
            if let Some(lines) = current.take() {
                parts.push(lines.join("\n"));
            }
            break;
        }
        if marker == delimiter {
            if let Some(lines) = current.replace(Vec::new()) {
                parts.push(lines.join("\n"));
            }
            continue;
        }
        if let Some(lines) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some(lines) = current {
        parts.push(lines.join("\n"));
    }
    parts
}

/// Separate a part's header block from its content at the first blank line.
fn split_headers(part: &str) -> (String, String) {
    let lines: Vec<&str> = part.split('\n').collect();
    match lines.iter().position(|l| l.trim().is_empty()) {
        Some(idx) => (lines[..idx].join("\n"), lines[idx + 1..].join("\n")),
        None => (part.to_string(), String::new()),
    }
}

fn capture(regex: &Regex, body: &str) -> Option<String> {
    regex
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| strip_part_headers(m.as_str()))
}

/// Drop the remaining header lines of a sub-part and trim the content.
fn strip_part_headers(part: &str) -> String {
    let mut lines = part.lines().peekable();
    while let Some(line) = lines.peek() {
        if line.trim().is_empty() {
            lines.next();
            break;
        }
        if is_header_line(line) {
            lines.next();
        } else {
            break;
        }
    }
    lines.collect::<Vec<_>>().join("\n").trim().to_string()
}

fn is_header_line(line: &str) -> bool {
    if line.starts_with([' ', '\t']) {
        return true;
    }
    match line.split_once(':') {
        Some((name, _)) => {
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        None => false,
    }
}
