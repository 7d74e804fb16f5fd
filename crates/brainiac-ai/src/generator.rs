// ABOUTME: Generation collaborator for article metadata
// ABOUTME: Field extraction and relatedness requests with strict decoding

use brainiac_core::{ArticleSummary, BrainiacError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::llm_provider::{GenerationConfig, LLMProvider, Message, ResponseFormat};
use crate::prompts::PromptSet;
use crate::response_schemas::{
    decode_fields, decode_relatedness, fields_response_format, relatedness_response_format,
    GeneratedFieldsResponse, GeneratedRelatednessResponse, RelatednessInput, FIELDS_SCHEMA_NAME,
    RELATEDNESS_SCHEMA_NAME,
};

/// Issues the field-extraction and relatedness requests.
///
/// Every provider failure and every payload that fails validation surfaces
/// as [`BrainiacError::Generation`]; nothing is retried and no default is
/// substituted.
pub struct MetadataGenerator {
    provider: Arc<dyn LLMProvider>,
    prompts: PromptSet,
    generation: GenerationConfig,
}

impl MetadataGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, prompts: PromptSet) -> Self {
        Self {
            provider,
            prompts,
            generation: GenerationConfig::default(),
        }
    }

    /// Replace the sampling parameters; the response format is always set per request
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Derive title, description, keywords and genre from the article text
    pub async fn extract_fields(&self, article: &str) -> Result<GeneratedFieldsResponse> {
        let raw = self
            .request(
                FIELDS_SCHEMA_NAME,
                &self.prompts.field_extraction,
                article.to_string(),
                fields_response_format(),
            )
            .await?;

        let fields = decode_fields(&raw).map_err(|reason| rejected(FIELDS_SCHEMA_NAME, reason))?;
        info!(title = %fields.title, genre = %fields.genre, "Extracted article fields");
        Ok(fields)
    }

    /// Rank up to two entries of `articles` by relatedness to the article text.
    ///
    /// The new article is not part of `articles`, so it cannot rank itself.
    pub async fn resolve_relatedness(
        &self,
        articles: &[ArticleSummary],
        article: &str,
    ) -> Result<GeneratedRelatednessResponse> {
        let input = serde_json::to_string(&RelatednessInput {
            articles,
            target: article,
        })?;

        let raw = self
            .request(
                RELATEDNESS_SCHEMA_NAME,
                &self.prompts.relatedness,
                input,
                relatedness_response_format(),
            )
            .await?;

        let known: HashSet<&str> = articles.iter().map(|a| a.slug.as_str()).collect();
        let related = decode_relatedness(&raw, &known)
            .map_err(|reason| rejected(RELATEDNESS_SCHEMA_NAME, reason))?;

        info!(
            candidates = articles.len(),
            related = ?related.related_articles,
            "Resolved related articles"
        );
        Ok(related)
    }

    async fn request(
        &self,
        schema_name: &str,
        instructions: &str,
        input: String,
        response_format: ResponseFormat,
    ) -> Result<String> {
        let messages = [Message::system(instructions), Message::user(input)];
        let config = GenerationConfig {
            response_format: Some(response_format),
            ..self.generation.clone()
        };

        debug!(
            schema = schema_name,
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            "Sending generation request"
        );

        let response = self
            .provider
            .generate_chat(&messages, &config)
            .await
            .map_err(|e| BrainiacError::Generation(format!("{} request failed: {:#}", schema_name, e)))?;

        debug!(
            schema = schema_name,
            total_tokens = ?response.total_tokens,
            finish_reason = ?response.finish_reason,
            "Generation request completed"
        );
        Ok(response.content)
    }
}

fn rejected(schema_name: &str, reason: String) -> BrainiacError {
    BrainiacError::Generation(format!("{} response rejected: {}", schema_name, reason))
}
