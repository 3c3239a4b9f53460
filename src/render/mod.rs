//! Message content pipeline.
//!
//! Turns a stored [`MessageContent`] into something a client can display:
//!
//! 1. HTML is sanitized and, unless images are shown, every `<img>` is
//!    replaced with a placeholder. An image notice is always attached.
//! 2. Plain text becomes one paragraph per line.
//! 3. A raw multipart payload yields its HTML sub-part, else its plain text
//!    sub-part, else the payload itself as preformatted text.
//! 4. Anything else falls back to the preview, or to an empty marker.

mod multipart;
mod sanitize;

pub use multipart::{extract_part, is_multipart, Part};
pub use sanitize::{
    block_images, escape_html, html_to_text, sanitize_html, BLOCKED_IMAGE_PLACEHOLDER,
};

use serde::Serialize;

use crate::mail::MessageContent;

/// Notice attached to rendered HTML.
pub const IMAGE_NOTICE: &str = "Images in this message are blocked to protect your privacy.";

/// Notice attached to rendered HTML once images are shown.
pub const IMAGES_SHOWN_NOTICE: &str = "Images in this message are displayed.";

/// Marker used when a message has nothing to display.
pub const NO_CONTENT: &str = "No content available";

/// Per-render switches controlled by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Keep `<img>` tags instead of replacing them.
    pub show_images: bool,
}

/// Content ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayContent {
    /// Sanitized markup with an image notice.
    Html {
        notice: String,
        images_blocked: bool,
        markup: String,
    },
    /// One entry per line of plain text; blank lines are kept.
    Paragraphs { paragraphs: Vec<String> },
    /// Raw payload shown verbatim.
    Preformatted { text: String },
    /// Excerpt computed from the message body.
    Preview { text: String },
    /// Nothing to show.
    Empty,
}

impl DisplayContent {
    /// Render as an HTML fragment. Text variants are escaped.
    pub fn to_html(&self) -> String {
        match self {
            DisplayContent::Html { notice, markup, .. } => format!(
                "<div class=\"image-notice\">{}</div>\n{markup}",
                escape_html(notice)
            ),
            DisplayContent::Paragraphs { paragraphs } => paragraphs
                .iter()
                .map(|p| format!("<p>{}</p>", escape_html(p)))
                .collect::<Vec<_>>()
                .join("\n"),
            DisplayContent::Preformatted { text } => format!("<pre>{}</pre>", escape_html(text)),
            DisplayContent::Preview { text } => format!("<p>{}</p>", escape_html(text)),
            DisplayContent::Empty => format!("<p>{NO_CONTENT}</p>"),
        }
    }
}

/// Render message content for display.
///
/// `preview` is the excerpt shown when nothing better is available.
pub fn render(content: &MessageContent, preview: &str, options: RenderOptions) -> DisplayContent {
    match content {
        MessageContent::Html(html) => render_html(html, options),
        MessageContent::Text(text) => paragraphs(text),
        MessageContent::Raw(body) if is_multipart(body) => match extract_part(body) {
            Some(Part::Html(html)) => render_html(&html, options),
            Some(Part::Text(text)) => paragraphs(&text),
            None => DisplayContent::Preformatted { text: body.clone() },
        },
        MessageContent::Raw(_) | MessageContent::Empty => {
            if preview.trim().is_empty() {
                DisplayContent::Empty
            } else {
                DisplayContent::Preview {
                    text: preview.to_string(),
                }
            }
        }
    }
}

fn render_html(html: &str, options: RenderOptions) -> DisplayContent {
    let sanitized = sanitize_html(html);
    if options.show_images {
        DisplayContent::Html {
            notice: IMAGES_SHOWN_NOTICE.to_string(),
            images_blocked: false,
            markup: sanitized,
        }
    } else {
        DisplayContent::Html {
            notice: IMAGE_NOTICE.to_string(),
            images_blocked: true,
            markup: block_images(&sanitized),
        }
    }
}

fn paragraphs(text: &str) -> DisplayContent {
    DisplayContent::Paragraphs {
        paragraphs: text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect(),
    }
}

/// Plain text excerpt of a message, at most `max_chars` characters plus `...`.
pub fn preview_of(content: &MessageContent, max_chars: usize) -> String {
    let text = match content {
        MessageContent::Html(html) => html_to_text(html),
        MessageContent::Text(text) => collapse_whitespace(text),
        MessageContent::Raw(body) if is_multipart(body) => match extract_part(body) {
            Some(Part::Html(html)) => html_to_text(&html),
            Some(Part::Text(text)) => collapse_whitespace(&text),
            None => collapse_whitespace(body),
        },
        MessageContent::Raw(body) => collapse_whitespace(body),
        MessageContent::Empty => String::new(),
    };
    truncate(&text, max_chars)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}
