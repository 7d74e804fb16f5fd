// ABOUTME: One-invocation pipeline from a source article to a persisted record
// ABOUTME: Loads the store, runs both generation requests, persists and copies

use brainiac_ai::MetadataGenerator;
use brainiac_core::files::{copy_new, read_file};
use brainiac_core::{
    reading_time_minutes, slugify, word_count, AnalyticsMetadata, BrainiacConfig, BrainiacError,
    ConfigError, InterestMetadata, MetadataRecord, MetadataStore, Result, DATETIME_FORMAT,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub struct Orchestrator {
    generator: MetadataGenerator,
    store_path: PathBuf,
    output_dir: PathBuf,
    author: String,
}

impl Orchestrator {
    pub fn new(generator: MetadataGenerator, config: &BrainiacConfig) -> Result<Self> {
        let output_dir = config
            .storage
            .output_directory
            .clone()
            .ok_or(ConfigError::MissingValue("storage.output_directory"))?;
        let store_path = output_dir.join(&config.storage.metadata_storage_name);

        Ok(Self {
            generator,
            store_path,
            output_dir,
            author: config.author.clone(),
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Generate, persist and copy metadata for the article at `src`.
    ///
    /// If the copy fails after the store was persisted, the store keeps the
    /// new record and the error is returned; nothing is rolled back.
    pub async fn run(&self, src: &Path) -> Result<MetadataRecord> {
        if !src.exists() {
            return Err(BrainiacError::UserInput(format!(
                "source file {} does not exist",
                src.display()
            )));
        }
        if !src.is_file() {
            return Err(BrainiacError::UserInput(format!(
                "source path {} is not a regular file",
                src.display()
            )));
        }

        let mut store = MetadataStore::load(&self.store_path)?;
        let article = read_file(src)?;
        info!(
            src = %src.display(),
            existing_records = store.len(),
            "Generating metadata"
        );

        let view = store.to_aggregate_view();
        let (fields, relatedness) = tokio::try_join!(
            self.generator.extract_fields(&article),
            self.generator.resolve_relatedness(&view, &article),
        )?;

        let slug = slugify(&fields.title);
        if slug.is_empty() {
            return Err(BrainiacError::Generation(format!(
                "title '{}' produces an empty slug",
                fields.title
            )));
        }

        let mut related_articles = relatedness.related_articles;
        if related_articles.iter().any(|s| *s == slug) {
            warn!(slug = %slug, "Dropping self-reference from related articles");
            related_articles.retain(|s| *s != slug);
        }

        let record = MetadataRecord {
            title: fields.title,
            description: fields.description,
            author: self.author.clone(),
            slug: slug.clone(),
            analytics: AnalyticsMetadata {
                created_at: chrono::Local::now().format(DATETIME_FORMAT).to_string(),
                length_in_words: word_count(&article),
                reading_time_in_minutes: reading_time_minutes(&article),
            },
            interest: InterestMetadata {
                keywords: fields.keywords,
                genre: fields.genre,
                related_articles,
            },
        };

        store.push(record.clone());
        store.persist(&self.store_path)?;
        info!(slug = %slug, store = %self.store_path.display(), "Persisted metadata store");

        let dest = self.output_dir.join(format!("{}.md", slug));
        if let Err(e) = copy_new(&dest, &article) {
            error!(
                slug = %slug,
                dest = %dest.display(),
                "Store references a slug whose article copy failed"
            );
            return Err(e);
        }
        info!(dest = %dest.display(), "Copied article");

        Ok(record)
    }
}
