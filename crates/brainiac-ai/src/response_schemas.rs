// ABOUTME: Statically declared JSON schemas for structured generation outputs
// ABOUTME: Decodes and validates field-extraction and relatedness responses

use brainiac_core::{ArticleSummary, Genre};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::warn;

use crate::llm_provider::{JsonSchema, ResponseFormat};

pub const FIELDS_SCHEMA_NAME: &str = "MetadataGeneratedResponse";
pub const RELATEDNESS_SCHEMA_NAME: &str = "InterestMetadataGeneratedResponse";

/// Most related articles returned per request
pub const MAX_RELATED_ARTICLES: usize = 2;
pub const MIN_KEYWORDS: usize = 5;
pub const MAX_KEYWORDS: usize = 8;
pub const MAX_TITLE_CHARS: usize = 60;
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Output of the field-extraction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedFieldsResponse {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub genre: Genre,
}

/// Output of the relatedness request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedRelatednessResponse {
    /// Slugs, most related first
    pub related_articles: Vec<String>,
}

/// Payload sent as the relatedness request input
#[derive(Debug, Serialize)]
pub struct RelatednessInput<'a> {
    pub articles: &'a [ArticleSummary],
    pub target: &'a str,
}

pub fn fields_schema() -> Value {
    let genres: Vec<&str> = Genre::ALL.iter().map(Genre::as_str).collect();
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Concise, engaging headline of at most 60 characters"
            },
            "description": {
                "type": "string",
                "description": "One or two sentence summary of at most 200 characters"
            },
            "keywords": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": MIN_KEYWORDS,
                "maxItems": MAX_KEYWORDS
            },
            "genre": {
                "type": "string",
                "enum": genres
            }
        },
        "required": ["title", "description", "keywords", "genre"],
        "additionalProperties": false
    })
}

pub fn relatedness_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "related_articles": {
                "type": "array",
                "items": { "type": "string" },
                "maxItems": MAX_RELATED_ARTICLES,
                "description": "Slugs of the most related articles, most related first"
            }
        },
        "required": ["related_articles"],
        "additionalProperties": false
    })
}

/// Generate ResponseFormat for field extraction
pub fn fields_response_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: JsonSchema {
            name: FIELDS_SCHEMA_NAME.to_string(),
            description: Some("Metadata of the article represented in json".to_string()),
            schema: fields_schema(),
            strict: true,
        },
    }
}

/// Generate ResponseFormat for relatedness
pub fn relatedness_response_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: JsonSchema {
            name: RELATEDNESS_SCHEMA_NAME.to_string(),
            description: Some("Interest metadata on the article represented in json".to_string()),
            schema: relatedness_schema(),
            strict: true,
        },
    }
}

/// Decode a field-extraction payload.
///
/// Missing keys, extra keys, wrong types and genres outside the enumeration
/// are rejected. Length and keyword-count limits are soft and only warned on.
pub fn decode_fields(raw: &str) -> Result<GeneratedFieldsResponse, String> {
    let fields: GeneratedFieldsResponse =
        serde_json::from_str(raw.trim()).map_err(|e| e.to_string())?;

    if fields.title.trim().is_empty() {
        return Err("title is empty".to_string());
    }
    if fields.description.trim().is_empty() {
        return Err("description is empty".to_string());
    }
    if fields.keywords.is_empty() {
        return Err("keywords is empty".to_string());
    }
    if fields.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err("keywords contains an empty entry".to_string());
    }

    let title_chars = fields.title.chars().count();
    if title_chars > MAX_TITLE_CHARS {
        warn!(title_chars, "Generated title exceeds {} characters", MAX_TITLE_CHARS);
    }
    let description_chars = fields.description.chars().count();
    if description_chars > MAX_DESCRIPTION_CHARS {
        warn!(
            description_chars,
            "Generated description exceeds {} characters", MAX_DESCRIPTION_CHARS
        );
    }
    if !(MIN_KEYWORDS..=MAX_KEYWORDS).contains(&fields.keywords.len()) {
        warn!(
            keywords = fields.keywords.len(),
            "Generated keyword count outside {}-{}", MIN_KEYWORDS, MAX_KEYWORDS
        );
    }

    Ok(fields)
}

/// Decode a relatedness payload against the slugs that were offered.
///
/// At most two entries, no duplicates, and every slug must be one of `known`.
pub fn decode_relatedness(
    raw: &str,
    known: &HashSet<&str>,
) -> Result<GeneratedRelatednessResponse, String> {
    let response: GeneratedRelatednessResponse =
        serde_json::from_str(raw.trim()).map_err(|e| e.to_string())?;

    if response.related_articles.len() > MAX_RELATED_ARTICLES {
        return Err(format!(
            "{} related articles returned, at most {} allowed",
            response.related_articles.len(),
            MAX_RELATED_ARTICLES
        ));
    }

    let mut seen = HashSet::new();
    for slug in &response.related_articles {
        if !seen.insert(slug.as_str()) {
            return Err(format!("related article '{}' listed twice", slug));
        }
        if !known.contains(slug.as_str()) {
            return Err(format!("related article '{}' is not in the store", slug));
        }
    }

    Ok(response)
}
