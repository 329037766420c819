use std::sync::Arc;
use std::time::Duration;

use super::outcome::{AbsentReason, Outcome};
use super::providers::GenerativeProvider;
use super::throttle::Throttle;
use crate::feed::Category;

/// Generates cover images for items that arrive without a thumbnail
pub struct ImageSynthesizer {
    provider: Arc<dyn GenerativeProvider>,
    throttle: Arc<Throttle>,
    timeout: Duration,
}

impl ImageSynthesizer {
    pub fn new(provider: Arc<dyn GenerativeProvider>, throttle: Arc<Throttle>, timeout: Duration) -> Self {
        Self {
            provider,
            throttle,
            timeout,
        }
    }

    fn prompt(title: &str, category: Category) -> String {
        format!(
            "Editorial cover illustration for a {} news story titled \"{}\". Clean modern flat style, \
muted colors, no text, no logos, no recognizable faces.",
            category.as_str().to_lowercase(),
            title.trim()
        )
    }

    /// Best-effort image URL for (title, category). Never fails.
    pub async fn synthesize(&self, title: &str, category: Category) -> Outcome<String> {
        self.throttle.acquire().await;

        let prompt = Self::prompt(title, category);
        let call = self.provider.generate_image(&prompt);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(url)) => match url::Url::parse(url.trim()) {
                Ok(parsed) => Outcome::Present(parsed.to_string()),
                Err(e) => {
                    tracing::warn!("Image service returned an invalid URL for '{}': {}", title, e);
                    Outcome::Absent(AbsentReason::Failed(format!("invalid image URL: {}", e)))
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(provider = self.provider.name(), "Image synthesis failed for '{}': {}", title, e);
                Outcome::Absent(AbsentReason::Failed(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(provider = self.provider.name(), "Image synthesis timed out for '{}'", title);
                Outcome::Absent(AbsentReason::TimedOut)
            }
        }
    }
}
