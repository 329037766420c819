use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, CreateImageRequestArgs,
        Image, ImageModel, ImageResponseFormat, ImageSize,
    },
    Client,
};
use std::time::Duration;

use super::GenerativeProvider;
use crate::config::AiConfig;
use crate::{Error, Result};

fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

fn image_model(name: &str) -> ImageModel {
    match name {
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    }
}

/// OpenAI (or OpenAI-compatible) API provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    chat_model: String,
    image_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, config: &AiConfig) -> Result<Self> {
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(ref base) = config.openai_base_url {
            openai_config = openai_config.with_api_base(base);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(Error::Http)?;

        let client = Client::with_config(openai_config).with_http_client(http_client);

        Ok(Self {
            client,
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
        })
    }
}

#[async_trait::async_trait]
impl GenerativeProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let prompt = truncate_chars(prompt, 4000);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(vec![
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system)
                        .build()
                        .map_err(|e| Error::AiProvider(e.to_string()))?,
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(prompt)
                        .build()
                        .map_err(|e| Error::AiProvider(e.to_string()))?,
                ),
            ])
            .max_tokens(max_tokens)
            .temperature(0.8)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let request = CreateImageRequestArgs::default()
            .prompt(truncate_chars(prompt, 1000))
            .model(image_model(&self.image_model))
            .n(1)
            .size(ImageSize::S1024x1024)
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let response = self
            .client
            .images()
            .create(request)
            .await
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        response
            .data
            .first()
            .and_then(|image| match image.as_ref() {
                Image::Url { url, .. } => Some(url.clone()),
                _ => None,
            })
            .ok_or_else(|| Error::AiProvider("image response contained no URL".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("शेयर बाजार", 4), "शेयर");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_image_model_mapping() {
        assert!(matches!(image_model("dall-e-3"), ImageModel::DallE3));
        assert!(matches!(image_model("gpt-image-1"), ImageModel::Other(ref m) if m == "gpt-image-1"));
    }
}
