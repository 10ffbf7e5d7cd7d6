use async_trait::async_trait;
use tracing::error;

use crate::clients::anthropic_client;
use crate::config::ModelSettings;
use crate::error::InterpretError;

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, InterpretError>;
}

pub struct AnthropicService {
    http: reqwest::Client,
    settings: ModelSettings,
}

impl AnthropicService {
    pub fn new(settings: ModelSettings) -> Result<Self, InterpretError> {
        let http = anthropic_client::build_http_client(&settings)?;
        Ok(Self { http, settings })
    }

    fn api_key(&self) -> Option<&str> {
        self.settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl ModelClient for AnthropicService {
    async fn complete(&self, prompt: &str) -> Result<String, InterpretError> {
        let Some(api_key) = self.api_key() else {
            error!("model client not configured, skipping request");
            return Err(InterpretError::MissingApiKey);
        };
        anthropic_client::query_anthropic(&self.http, &self.settings, api_key, prompt).await
    }
}
