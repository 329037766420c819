/// Keyword relevance filter applied before any expensive per-item work
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    /// Lowercased, trimmed, non-empty terms
    keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = Vec::new();
        for keyword in keywords {
            let term = keyword.as_ref().trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        Self { keywords: terms }
    }

    /// True when title or body contains at least one keyword (case-insensitive substring)
    pub fn is_relevant(&self, title: &str, body: &str) -> bool {
        let title = title.to_lowercase();
        let body = body.to_lowercase();
        self.keywords
            .iter()
            .any(|k| title.contains(k.as_str()) || body.contains(k.as_str()))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
