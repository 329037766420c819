use super::cleaner::clean_text;

/// Hard cap for both the primary and the secondary summary
pub const MAX_SUMMARY_WORDS: usize = 60;

/// Candidate sentences shorter than this (in chars) are noise such as bylines
const MIN_SENTENCE_CHARS: usize = 10;

/// Below this many words a partial sentence is taken instead of stopping
const PARTIAL_SENTENCE_THRESHOLD: usize = 30;

const ELLIPSIS: &str = "...";

const COMPOUND_SEPARATORS: [char; 4] = ['-', '/', '–', '—'];

/// Weight of one whitespace token: hyphen- or slash-joined compounds count per component
fn token_weight(token: &str) -> usize {
    token
        .split(COMPOUND_SEPARATORS)
        .filter(|part| part.chars().any(char::is_alphanumeric))
        .count()
        .max(1)
}

/// Count words the way the summary cap is enforced
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().map(token_weight).sum()
}

/// Take leading tokens while the running word count stays within `limit`.
/// Returns the taken text and whether anything was dropped.
fn take_words(text: &str, limit: usize) -> (String, bool) {
    let mut taken: Vec<&str> = Vec::new();
    let mut count = 0;

    for token in text.split_whitespace() {
        let weight = token_weight(token);
        if count + weight > limit {
            if taken.is_empty() {
                return (take_compound_parts(token, limit), true);
            }
            return (taken.join(" "), true);
        }
        count += weight;
        taken.push(token);
    }

    (taken.join(" "), false)
}

/// Leading parts of a compound token that is on its own heavier than `limit`
fn take_compound_parts(token: &str, limit: usize) -> String {
    let mut end = 0;
    for piece in token.split_inclusive(COMPOUND_SEPARATORS) {
        let candidate = &token[..end + piece.len()];
        if token_weight(candidate.trim_end_matches(COMPOUND_SEPARATORS)) > limit {
            break;
        }
        end += piece.len();
    }
    token[..end].trim_end_matches(COMPOUND_SEPARATORS).to_string()
}

/// Cap arbitrary text at `limit` words, marking a cut with an ellipsis
pub fn cap_words(text: &str, limit: usize) -> String {
    let (head, dropped) = take_words(text, limit);
    if dropped && !head.is_empty() {
        with_ellipsis(&head)
    } else {
        head
    }
}

fn with_ellipsis(text: &str) -> String {
    let trimmed = text.trim_end_matches(|c: char| c.is_whitespace() || ",;:.!?-–—".contains(c));
    format!("{}{}", trimmed, ELLIPSIS)
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | ')' | ']')
}

fn ensure_terminal(mut summary: String) -> String {
    if summary.is_empty() || summary.ends_with(ELLIPSIS) || summary.ends_with('…') {
        return summary;
    }

    let core = summary.trim_end_matches(is_closing);
    if core.ends_with(is_terminal) {
        return summary;
    }

    let keep = summary.trim_end_matches([',', ';', ':']).len();
    summary.truncate(keep);
    summary.push('.');
    summary
}

/// Split cleaned text into candidate sentences, dropping short fragments
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminal(chars[i].1) {
            i += 1;
            continue;
        }

        // Absorb runs like "?!" and closing quotes after the terminal mark
        let mut j = i + 1;
        while j < chars.len() && (is_terminal(chars[j].1) || is_closing(chars[j].1)) {
            j += 1;
        }

        if j == chars.len() || chars[j].1.is_whitespace() {
            let end = chars.get(j).map_or(text.len(), |(idx, _)| *idx);
            sentences.push(text[start..end].trim());
            start = end;
        }
        i = j;
    }

    if start < text.len() {
        sentences.push(text[start..].trim());
    }

    sentences
        .into_iter()
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .collect()
}

/// Deterministic extractive summary capped at [`MAX_SUMMARY_WORDS`]
pub fn summarize(text: &str) -> String {
    summarize_with_limit(text, MAX_SUMMARY_WORDS)
}

/// Extractive summary with an explicit word cap
pub fn summarize_with_limit(text: &str, max_words: usize) -> String {
    let cleaned = clean_text(text);
    if cleaned.is_empty() || max_words == 0 {
        return String::new();
    }

    let mut parts: Vec<String> = Vec::new();
    let mut count = 0;

    for sentence in split_sentences(&cleaned) {
        let words = word_count(sentence);
        if count + words <= max_words {
            parts.push(sentence.to_string());
            count += words;
            continue;
        }

        if count < PARTIAL_SENTENCE_THRESHOLD.min(max_words) {
            let (partial, _) = take_words(sentence, max_words - count);
            if !partial.is_empty() {
                parts.push(with_ellipsis(&partial));
            }
        }
        break;
    }

    let summary = if parts.is_empty() {
        cap_words(&cleaned, max_words)
    } else {
        parts.join(" ")
    };

    ensure_terminal(summary)
}
