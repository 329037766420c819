use std::sync::Arc;
use std::time::Duration;

use super::outcome::{AbsentReason, Outcome};
use super::providers::GenerativeProvider;
use super::throttle::Throttle;
use crate::summary::{cap_words, MAX_SUMMARY_WORDS};

/// Produces the colloquial secondary-language summary
pub struct Localizer {
    provider: Arc<dyn GenerativeProvider>,
    throttle: Arc<Throttle>,
    language: String,
    max_tokens: u32,
    timeout: Duration,
}

impl Localizer {
    pub fn new(
        provider: Arc<dyn GenerativeProvider>,
        throttle: Arc<Throttle>,
        language: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            throttle,
            language: language.to_string(),
            max_tokens: max_tokens.max(1),
            timeout,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn style_directive(&self) -> String {
        let language = &self.language;
        format!(
            "You write short market news briefs in casual, conversational {language}, the way people \
talk about money with friends. Keep everyday English market words such as shares, market, IPO, \
stock and profit in English where that sounds natural. Write between 50 and 60 words. Do not \
translate literally and avoid formal or bookish {language}. Reply with the brief only, no heading, \
no quotes."
        )
    }

    /// Best-effort secondary summary of (title, primary summary). Never fails.
    pub async fn localize(&self, title: &str, summary: &str) -> Outcome<String> {
        let prompt = format!("Headline: {}\n\nSummary: {}", title.trim(), summary.trim());

        self.throttle.acquire().await;

        let directive = self.style_directive();
        let call = self.provider.complete(&directive, &prompt, self.max_tokens);

        let reply = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(provider = self.provider.name(), "Localization failed for '{}': {}", title, e);
                return Outcome::Absent(AbsentReason::Failed(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(provider = self.provider.name(), "Localization timed out for '{}'", title);
                return Outcome::Absent(AbsentReason::TimedOut);
            }
        };

        match normalize_reply(&reply) {
            Some(text) => Outcome::Present(text),
            None => {
                tracing::warn!(provider = self.provider.name(), "Empty localization for '{}'", title);
                Outcome::Absent(AbsentReason::EmptyResponse)
            }
        }
    }
}

/// Trim wrapping quotes and whitespace, then hard-cap the word count
fn normalize_reply(reply: &str) -> Option<String> {
    let text = reply
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '`'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return None;
    }

    Some(cap_words(&text, MAX_SUMMARY_WORDS))
}
