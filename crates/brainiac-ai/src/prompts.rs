//! Built-in instructions for the two generation requests.
//!
//! Prompt wording is tunable: a [`PromptSet`] can replace either prompt with the
//! contents of a file named in configuration.

use brainiac_core::{files::read_file, PromptConfig, Result};
use tracing::info;

pub const FIELD_EXTRACTION_PROMPT: &str = r#"You are an expert editorial assistant. Given the content of an article, produce exactly four outputs as JSON:

1. "title": a concise, engaging headline of at most 60 characters that captures the topic and the flavor of its genre.
2. "description": a one or two sentence summary of at most 200 characters that expands on the core idea in the tone of the chosen genre.
3. "keywords": an array of 5 to 8 relevant, high-impact keywords or short phrases that improve discoverability.
4. "genre": exactly one of OPINION, TECHNOLOGY, LIFESTYLE. Pick the genre that best fits the topic and write the title and description in that genre's style.

Tone by genre:
- OPINION: bold, personal, provocative
- TECHNOLOGY: precise, informative, forward-looking
- LIFESTYLE: warm, relatable, experiential

Output only valid JSON with exactly these four keys and no commentary."#;

pub const RELATEDNESS_PROMPT: &str = r#"You are an editorial assistant. The input is a JSON object with two fields:
- "articles": an array of article metadata objects, each with title, description, keywords, slug and genre (OPINION, TECHNOLOGY or LIFESTYLE)
- "target": the full text of a new article

Compare the target with every entry in "articles" using title, description, keywords and genre, and pick the two most related articles.

Respond with a JSON object {"related_articles": [...]} holding their slugs ordered from most to next-most related. Only use slugs that appear in "articles". Return fewer slugs when fewer articles exist, and an empty array when "articles" is empty. No extra text."#;

/// Instructions used for field extraction and relatedness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub field_extraction: String,
    pub relatedness: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            field_extraction: FIELD_EXTRACTION_PROMPT.to_string(),
            relatedness: RELATEDNESS_PROMPT.to_string(),
        }
    }
}

impl PromptSet {
    /// Built-in prompts with any configured file overrides applied
    pub fn from_config(config: &PromptConfig) -> Result<Self> {
        let mut prompts = Self::default();

        if let Some(path) = &config.extraction_file {
            prompts.field_extraction = read_file(path)?;
            info!(path = %path.display(), "Using field extraction prompt override");
        }
        if let Some(path) = &config.relatedness_file {
            prompts.relatedness = read_file(path)?;
            info!(path = %path.display(), "Using relatedness prompt override");
        }

        Ok(prompts)
    }
}
