use regex::Regex;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"))
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("valid url pattern"))
}

fn truncation_marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:\.\.\.|…)?\s*\[\+\s*\d+\s*chars?\]").expect("valid truncation marker pattern")
    })
}

/// Strip markup, URLs and "[+N chars]" markers, then collapse whitespace
pub fn clean_text(input: &str) -> String {
    let text = tag_pattern().replace_all(input, " ");
    let text = url_pattern().replace_all(&text, " ");
    let text = truncation_marker_pattern().replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
