use chrono::{DateTime, Utc};
use feed_rs::parser;

use super::models::RawItem;
use crate::{Error, Result};

/// Wide enough that html2text never wraps a paragraph
const TEXT_WIDTH: usize = 10_000;

/// Simple pattern matching for extracting image URLs from HTML
fn extract_first_image_url(html: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets valid for slicing the original
    let html_lower = html.to_ascii_lowercase();

    let img_start = html_lower.find("<img")?;
    let remaining = &html[img_start..];

    let src_start = html_lower[img_start..].find("src=")?;
    let src_remaining = &remaining[src_start + 4..];

    // Handle both src="url" and src='url'
    let quote_char = src_remaining.chars().next()?;
    if quote_char != '"' && quote_char != '\'' {
        return None;
    }

    let url_end = src_remaining[1..].find(quote_char)?;
    let url = &src_remaining[1..1 + url_end];

    // Filter out small images (likely icons/tracking pixels)
    if url.is_empty() || url.contains("1x1") || url.contains("pixel") || url.contains("tracking") {
        return None;
    }

    Some(url.to_string())
}

/// Parse RSS/Atom feed content into raw items, in document order
pub fn parse_feed(content: &[u8]) -> Result<Vec<RawItem>> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .filter(|l| !l.is_empty())
                .or_else(|| {
                    // RSS guids are frequently the permalink
                    let id = entry.id.trim();
                    (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
                });

            let title = entry
                .title
                .map(|t| collapse_whitespace(&t.content))
                .unwrap_or_default();

            let markup = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| entry.summary.map(|s| s.content));

            let body = markup.as_deref().map(html_to_text).unwrap_or_default();

            let published_at = entry
                .published
                .or(entry.updated)
                .map(DateTime::<Utc>::from);

            // Extract image URL from media thumbnail, media content, or HTML content
            let image_url = entry
                .media
                .first()
                .and_then(|m| m.thumbnails.first())
                .map(|t| t.image.uri.clone())
                .or_else(|| {
                    entry
                        .media
                        .first()
                        .and_then(|m| m.content.first())
                        .and_then(|c| c.url.as_ref())
                        .map(|u| u.to_string())
                })
                .or_else(|| markup.as_deref().and_then(extract_first_image_url));

            let mut tags: Vec<String> = Vec::new();
            for category in entry.categories {
                let tag = category.label.unwrap_or(category.term);
                let tag = collapse_whitespace(&tag);
                if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                    tags.push(tag);
                }
            }

            RawItem {
                title,
                link,
                published_at,
                body,
                image_url,
                tags,
            }
        })
        .collect();

    Ok(items)
}

/// Convert HTML content to plain text
fn html_to_text(html: &str) -> String {
    let text = html2text::config::plain()
        .string_from_read(html.as_bytes(), TEXT_WIDTH)
        .unwrap_or_else(|_| html.to_string());
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
