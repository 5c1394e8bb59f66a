use std::sync::Arc;

use crate::core::config::GenerationSettings;
use crate::core::errors::ApiError;
use crate::llm::provider::{FragmentReceiver, LlmProvider};
use crate::llm::types::{ChatMessage, ChatRequest, GenerateParams};

/// Generation adapter: applies instance defaults, then delegates to the provider.
#[derive(Clone)]
pub struct GenerationService {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl GenerationService {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn from_settings(provider: Arc<dyn LlmProvider>, settings: &GenerationSettings) -> Self {
        tracing::info!(
            "Initializing {} client with model: {}",
            provider.name(),
            settings.model
        );
        Self::new(
            provider,
            settings.model.clone(),
            settings.temperature,
            settings.max_tokens,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, params: GenerateParams) -> Result<String, ApiError> {
        let request = self.resolve(
            params.messages(),
            params.temperature,
            params.max_tokens,
            params.stop,
        );
        tracing::info!("Generating response with model: {}", self.model);

        let response = self.provider.chat(request, &self.model).await.map_err(|e| {
            tracing::error!("Error generating response: {}", e);
            e
        })?;

        tracing::info!("Generated {} characters", response.chars().count());
        Ok(response)
    }

    pub async fn generate_stream(
        &self,
        params: GenerateParams,
    ) -> Result<FragmentReceiver, ApiError> {
        let request = self.resolve(
            params.messages(),
            params.temperature,
            params.max_tokens,
            params.stop,
        );
        tracing::info!("Starting streaming generation with model: {}", self.model);

        self.provider
            .stream_chat(request, &self.model)
            .await
            .map_err(|e| {
                tracing::error!("Error in streaming generation: {}", e);
                e
            })
    }

    /// Multi-turn chat over caller-supplied messages.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f64>,
        max_tokens: Option<u32>,
    ) -> Result<String, ApiError> {
        tracing::info!("Processing chat with {} messages", messages.len());
        let request = self.resolve(messages, temperature, max_tokens, None);
        self.provider.chat(request, &self.model).await.map_err(|e| {
            tracing::error!("Error in chat: {}", e);
            e
        })
    }

    fn resolve(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f64>,
        max_tokens: Option<u32>,
        stop: Option<Vec<String>>,
    ) -> ChatRequest {
        let mut request = ChatRequest::new(messages);
        request.temperature = Some(temperature.unwrap_or(self.temperature));
        // zero is "unset", matching the falsy default of the HTTP contract
        request.max_tokens = Some(max_tokens.filter(|t| *t > 0).unwrap_or(self.max_tokens));
        request.stop = stop;
        request
    }
}
