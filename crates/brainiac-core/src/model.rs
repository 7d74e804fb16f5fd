// ABOUTME: Metadata record model persisted in the aggregate store
// ABOUTME: Identity, descriptive, analytics and interest fields for one article

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format of `AnalyticsMetadata::created_at`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Closed set of editorial genres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Genre {
    Opinion,
    Technology,
    Lifestyle,
}

impl Genre {
    pub const ALL: [Genre; 3] = [Genre::Opinion, Genre::Technology, Genre::Lifestyle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Opinion => "OPINION",
            Genre::Technology => "TECHNOLOGY",
            Genre::Lifestyle => "LIFESTYLE",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown genre '{}'", s))
    }
}

/// Locally computed statistics about the article text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsMetadata {
    /// Creation timestamp, formatted with [`DATETIME_FORMAT`]
    pub created_at: String,
    pub length_in_words: u64,
    pub reading_time_in_minutes: u64,
}

/// Discoverability and relatedness fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterestMetadata {
    pub keywords: Vec<String>,
    pub genre: Genre,
    /// Slugs of up to two existing articles, most related first
    pub related_articles: Vec<String>,
}

/// One article's full metadata entry as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataRecord {
    pub title: String,
    pub description: String,
    pub author: String,
    /// Unique store key, derived from the title when the record is created
    pub slug: String,
    pub analytics: AnalyticsMetadata,
    pub interest: InterestMetadata,
}

impl MetadataRecord {
    /// Whether `related_articles` names this record's own slug
    pub fn references_itself(&self) -> bool {
        self.interest.related_articles.contains(&self.slug)
    }

    /// Projection sent to the relatedness resolver
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            title: self.title.clone(),
            description: self.description.clone(),
            keywords: self.interest.keywords.clone(),
            slug: self.slug.clone(),
            genre: self.interest.genre,
        }
    }
}

/// Subset of a record relevant to relatedness; analytics are left out so the
/// request payload only grows with descriptive fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub slug: String,
    pub genre: Genre,
}
