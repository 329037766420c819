pub mod providers;
mod image;
mod localizer;
mod outcome;
mod throttle;

pub use image::ImageSynthesizer;
pub use localizer::Localizer;
pub use outcome::{AbsentReason, Outcome};
pub use providers::{GenerativeProvider, OpenAiProvider};
pub use throttle::Throttle;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::Result;

/// Generative clients built once at startup and shared by every job
pub struct GenerativeServices {
    pub localizer: Localizer,
    /// Absent when image synthesis is switched off
    pub images: Option<ImageSynthesizer>,
}

impl GenerativeServices {
    /// Build the services from configuration, or `None` when no credential is available.
    /// The reason for running without them is logged once here.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        if !config.ai_available() {
            if config.ai.enabled {
                tracing::warn!(
                    "No generative API key configured; localization and image synthesis will be skipped"
                );
            } else {
                tracing::info!("Generative steps disabled in configuration; skipping localization and images");
            }
            return Ok(None);
        }

        let api_key = config.ai.openai_api_key.as_deref().unwrap_or_default();

        let provider: Arc<dyn GenerativeProvider> = Arc::new(OpenAiProvider::new(api_key, &config.ai)?);
        tracing::info!(
            provider = provider.name(),
            model = %config.ai.chat_model,
            language = %config.ai.secondary_language,
            "Generative services ready"
        );

        Ok(Some(Self::with_provider(provider, config)))
    }

    /// Wire a provider into the localizer and image synthesizer with a shared throttle
    pub fn with_provider(provider: Arc<dyn GenerativeProvider>, config: &AppConfig) -> Self {
        let throttle = Arc::new(Throttle::new(Duration::from_millis(config.ai.min_call_interval_ms)));
        let timeout = Duration::from_secs(config.ai.request_timeout_secs.max(1));

        let localizer = Localizer::new(
            Arc::clone(&provider),
            Arc::clone(&throttle),
            &config.ai.secondary_language,
            config.ai.max_summary_tokens,
            timeout,
        );

        let images = config
            .ai
            .images_enabled
            .then(|| ImageSynthesizer::new(provider, throttle, timeout));

        Self { localizer, images }
    }
}
