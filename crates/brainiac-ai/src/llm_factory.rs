use crate::llm_provider::LLMProvider;
use crate::openai_llm_provider::{OpenAIConfig, OpenAIProvider};
use anyhow::{anyhow, Result};
use brainiac_core::BrainiacConfig;
use std::sync::Arc;

/// Factory for creating LLM providers based on configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration
    pub fn create_from_config(config: &BrainiacConfig) -> Result<Arc<dyn LLMProvider>> {
        let provider_name = config.openai.provider.to_lowercase();

        match provider_name.as_str() {
            "openai" | "openai-compatible" => Self::create_openai_provider(config, &provider_name),
            _ => Err(anyhow!(
                "Unsupported LLM provider: {}. Available providers: {}",
                provider_name,
                Self::supported_providers().join(", ")
            )),
        }
    }

    /// Create an OpenAI (or Responses-API compatible) provider
    fn create_openai_provider(
        config: &BrainiacConfig,
        provider_name: &str,
    ) -> Result<Arc<dyn LLMProvider>> {
        let openai_config = OpenAIConfig {
            api_key: config.openai.api_key.clone(),
            base_url: config.openai.base_url.clone(),
            model: config.openai.model.clone(),
            timeout_secs: config.openai.timeout_secs,
            reasoning_effort: config.openai.reasoning_effort.clone(),
            provider_name: provider_name.to_string(),
        };

        Ok(Arc::new(OpenAIProvider::new(openai_config)?))
    }

    /// Get a list of supported providers
    pub fn supported_providers() -> Vec<&'static str> {
        vec!["openai", "openai-compatible"]
    }
}
