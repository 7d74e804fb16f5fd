pub mod generator;
pub mod llm_factory;
pub mod llm_provider;
pub mod openai_llm_provider;
pub mod prompts;
pub mod response_schemas;

pub use generator::MetadataGenerator;
pub use llm_factory::LLMProviderFactory;
pub use llm_provider::*;
pub use openai_llm_provider::{OpenAIConfig, OpenAIProvider};
pub use prompts::PromptSet;
pub use response_schemas::{GeneratedFieldsResponse, GeneratedRelatednessResponse};
