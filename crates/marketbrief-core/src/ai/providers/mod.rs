mod openai;

pub use openai::OpenAiProvider;

use crate::Result;

/// Trait for generative text/image services
#[async_trait::async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Run a single chat completion with a system directive and a user prompt
    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Generate one image and return its URL
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}
