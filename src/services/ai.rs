use anyhow::{anyhow, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use tokio::time::{sleep, Duration};

const MAX_RETRIES: u64 = 3;

/// Hosted text generation: one prompt in, one free-form reply out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Gemini reached through its OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct GeminiService {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiService {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut retries = 0;
        loop {
            let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into();
            let request = CreateChatCompletionRequestArgs::default()
                .model(self.model.as_str())
                .messages(vec![message])
                .build()?;

            match self.client.chat().create(request).await {
                Ok(resp) => {
                    let text = resp
                        .choices
                        .first()
                        .and_then(|c| c.message.content.clone())
                        .unwrap_or_default();
                    if text.trim().is_empty() {
                        return Err(anyhow!("text generation returned an empty reply"));
                    }
                    return Ok(text);
                }
                Err(err) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(anyhow!("text generation error: {err}"));
                    }
                    tracing::warn!("Text generation attempt {} failed: {}", retries, err);
                    sleep(Duration::from_millis(500 * retries)).await;
                }
            }
        }
    }
}
