use async_trait::async_trait;
use brainiac_ai::response_schemas::{FIELDS_SCHEMA_NAME, RELATEDNESS_SCHEMA_NAME};
use brainiac_ai::{
    GenerationConfig, LLMProvider, LLMResponse, LLMResult, Message, MetadataGenerator, PromptSet,
    ResponseFormat,
};
use brainiac_cli::Orchestrator;
use brainiac_core::{
    AnalyticsMetadata, BrainiacConfig, BrainiacError, Genre, InterestMetadata, MetadataRecord,
    MetadataStore,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const FOX_ARTICLE: &str = "The quick brown fox jumps over the lazy dog. \
The quick brown fox jumps over the lazy dog. \
The quick brown fox jumps over the lazy dog. \
The quick brown fox jumps over the lazy dog. \
Foxes are very clever.";

const FOX_FIELDS: &str = r#"{"title":"Fox Facts","description":"A playful look at the quick brown fox.","keywords":["fox","wildlife","nature","animals","agility"],"genre":"LIFESTYLE"}"#;

/// Replies with scripted JSON chosen by the requested schema name
struct MockProvider {
    fields: String,
    related: String,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new(fields: &str, related: &str) -> Arc<Self> {
        Arc::new(Self {
            fields: fields.to_string(),
            related: related.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn generate_chat(
        &self,
        _messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = match &config.response_format {
            Some(ResponseFormat::JsonSchema { json_schema })
                if json_schema.name == FIELDS_SCHEMA_NAME =>
            {
                self.fields.clone()
            }
            Some(ResponseFormat::JsonSchema { json_schema })
                if json_schema.name == RELATEDNESS_SCHEMA_NAME =>
            {
                self.related.clone()
            }
            other => anyhow::bail!("unexpected response format {:?}", other),
        };

        Ok(LLMResponse {
            content,
            total_tokens: Some(42),
            prompt_tokens: Some(30),
            completion_tokens: Some(12),
            finish_reason: Some("completed".to_string()),
            model: "mock-model".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

struct Fixture {
    dir: TempDir,
    config: BrainiacConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = BrainiacConfig::default();
        config.openai.api_key = "sk-test".to_string();
        config.openai.model = "mock-model".to_string();
        config.storage.output_directory = Some(dir.path().join("out"));
        config.storage.metadata_storage_name = "metadata.json".to_string();
        config.author = "Ada Writer".to_string();
        Self { dir, config }
    }

    fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn store_path(&self) -> PathBuf {
        self.output_dir().join("metadata.json")
    }

    fn write_source(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join("article.md");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn orchestrator(&self, provider: Arc<MockProvider>) -> Orchestrator {
        let generator = MetadataGenerator::new(provider, PromptSet::default());
        Orchestrator::new(generator, &self.config).unwrap()
    }

    fn seed(&self, records: Vec<MetadataRecord>) {
        let mut store = MetadataStore::new();
        for record in records {
            store.push(record);
        }
        store.persist(&self.store_path()).unwrap();
    }
}

fn existing(slug: &str, genre: Genre) -> MetadataRecord {
    MetadataRecord {
        title: format!("Existing {}", slug),
        description: "An earlier article.".to_string(),
        author: "Someone Else".to_string(),
        slug: slug.to_string(),
        analytics: AnalyticsMetadata {
            created_at: "2024-01-01 09:00:00".to_string(),
            length_in_words: 300,
            reading_time_in_minutes: 2,
        },
        interest: InterestMetadata {
            keywords: vec!["earlier".to_string()],
            genre,
            related_articles: vec![],
        },
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn fox_article_against_empty_store() {
    let fixture = Fixture::new();
    let src = fixture.write_source(FOX_ARTICLE);
    let provider = MockProvider::new(FOX_FIELDS, r#"{"related_articles":[]}"#);

    let record = fixture.orchestrator(provider.clone()).run(&src).await.unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(record.slug, "fox-facts");
    assert_eq!(record.title, "Fox Facts");
    assert_eq!(record.author, "Ada Writer");
    assert_eq!(record.analytics.length_in_words, 40);
    assert_eq!(record.analytics.reading_time_in_minutes, 1);
    assert_eq!(record.analytics.created_at.len(), "2024-01-01 09:00:00".len());
    assert_eq!(record.interest.genre, Genre::Lifestyle);
    assert!(record.interest.related_articles.is_empty());

    let stored = read_json(&fixture.store_path());
    let entries = stored["metadata"].as_object().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["fox-facts"]["slug"], "fox-facts");
    assert_eq!(entries["fox-facts"]["interest"]["related_articles"], serde_json::json!([]));

    let copied = std::fs::read_to_string(fixture.output_dir().join("fox-facts.md")).unwrap();
    assert_eq!(copied, FOX_ARTICLE);
}

#[tokio::test]
async fn related_articles_come_from_existing_records() {
    let fixture = Fixture::new();
    fixture.seed(vec![
        existing("forest-walks", Genre::Lifestyle),
        existing("gpu-benchmarks", Genre::Technology),
        existing("wild-neighbours", Genre::Opinion),
    ]);
    let src = fixture.write_source(FOX_ARTICLE);
    let provider = MockProvider::new(
        FOX_FIELDS,
        r#"{"related_articles":["wild-neighbours","forest-walks"]}"#,
    );

    let record = fixture.orchestrator(provider).run(&src).await.unwrap();

    assert_eq!(
        record.interest.related_articles,
        vec!["wild-neighbours", "forest-walks"]
    );
    let store = MetadataStore::load(&fixture.store_path()).unwrap();
    assert_eq!(store.len(), 4);
    let slugs: Vec<&str> = store.iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(
        slugs,
        vec!["forest-walks", "gpu-benchmarks", "wild-neighbours", "fox-facts"]
    );
}

#[tokio::test]
async fn existing_article_copy_is_a_conflict() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.output_dir()).unwrap();
    let dest = fixture.output_dir().join("fox-facts.md");
    std::fs::write(&dest, "original content").unwrap();
    let src = fixture.write_source(FOX_ARTICLE);

    let err = fixture
        .orchestrator(MockProvider::new(FOX_FIELDS, r#"{"related_articles":[]}"#))
        .run(&src)
        .await
        .unwrap_err();

    assert!(matches!(err, BrainiacError::FileConflict { ref path } if *path == dest));
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "original content");
    // The store was persisted before the copy and keeps the record
    let store = MetadataStore::load(&fixture.store_path()).unwrap();
    assert!(store.contains("fox-facts"));
}

#[tokio::test]
async fn colliding_slug_replaces_record_and_drops_self_reference() {
    let fixture = Fixture::new();
    fixture.seed(vec![
        existing("fox-facts", Genre::Opinion),
        existing("forest-walks", Genre::Lifestyle),
    ]);
    let src = fixture.write_source(FOX_ARTICLE);
    let provider = MockProvider::new(
        FOX_FIELDS,
        r#"{"related_articles":["fox-facts","forest-walks"]}"#,
    );

    let record = fixture.orchestrator(provider).run(&src).await.unwrap();

    assert_eq!(record.interest.related_articles, vec!["forest-walks"]);
    let store = MetadataStore::load(&fixture.store_path()).unwrap();
    assert_eq!(store.len(), 2);
    let replaced = store.get("fox-facts").unwrap();
    assert_eq!(replaced.author, "Ada Writer");
    assert_eq!(replaced.interest.genre, Genre::Lifestyle);
    assert!(!replaced.references_itself());
}

#[tokio::test]
async fn invalid_generation_leaves_store_untouched() {
    let cases = [
        (
            r#"{"title":"Fox Facts","description":"d","keywords":["fox"],"genre":"SPORTS"}"#,
            r#"{"related_articles":[]}"#,
        ),
        (
            r#"{"title":"Fox Facts","description":"d","keywords":["fox"]}"#,
            r#"{"related_articles":[]}"#,
        ),
        (FOX_FIELDS, r#"{"related_articles":["not-in-store"]}"#),
        (FOX_FIELDS, r#"{"related_articles":["a","b","c"]}"#),
        (
            r#"{"title":"!!!","description":"d","keywords":["fox"],"genre":"OPINION"}"#,
            r#"{"related_articles":[]}"#,
        ),
    ];

    for (fields, related) in cases {
        let fixture = Fixture::new();
        fixture.seed(vec![existing("forest-walks", Genre::Lifestyle)]);
        let before = std::fs::read(fixture.store_path()).unwrap();
        let src = fixture.write_source(FOX_ARTICLE);

        let err = fixture
            .orchestrator(MockProvider::new(fields, related))
            .run(&src)
            .await
            .unwrap_err();

        assert!(
            matches!(err, BrainiacError::Generation(_)),
            "expected Generation error for {} / {}, got {:?}",
            fields,
            related,
            err
        );
        assert_eq!(std::fs::read(fixture.store_path()).unwrap(), before);
        assert!(!fixture.output_dir().join("fox-facts.md").exists());
    }
}

#[tokio::test]
async fn missing_source_is_user_input_error() {
    let fixture = Fixture::new();
    let provider = MockProvider::new(FOX_FIELDS, r#"{"related_articles":[]}"#);

    let err = fixture
        .orchestrator(provider.clone())
        .run(&fixture.dir.path().join("missing.md"))
        .await
        .unwrap_err();

    assert!(matches!(err, BrainiacError::UserInput(_)));
    assert!(err.is_user_error());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert!(!fixture.store_path().exists());
}

#[tokio::test]
async fn directory_source_is_user_input_error() {
    let fixture = Fixture::new();
    let provider = MockProvider::new(FOX_FIELDS, r#"{"related_articles":[]}"#);

    let err = fixture
        .orchestrator(provider)
        .run(fixture.dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, BrainiacError::UserInput(_)));
}

#[tokio::test]
async fn corrupt_store_aborts_before_generation() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.output_dir()).unwrap();
    std::fs::write(fixture.store_path(), "{\"metadata\": [").unwrap();
    let src = fixture.write_source(FOX_ARTICLE);
    let provider = MockProvider::new(FOX_FIELDS, r#"{"related_articles":[]}"#);

    let err = fixture
        .orchestrator(provider.clone())
        .run(&src)
        .await
        .unwrap_err();

    assert!(matches!(err, BrainiacError::CorruptStore { .. }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accented_title_is_transliterated_into_the_slug() {
    let fixture = Fixture::new();
    let src = fixture.write_source(FOX_ARTICLE);
    let fields = r#"{"title":"Naïve Résumé Tips","description":"Resumes for foxes.","keywords":["resume","career","tips","writing","jobs"],"genre":"LIFESTYLE"}"#;

    let record = fixture
        .orchestrator(MockProvider::new(fields, r#"{"related_articles":[]}"#))
        .run(&src)
        .await
        .unwrap();

    assert_eq!(record.title, "Na\u{ef}ve R\u{e9}sum\u{e9} Tips");
    assert_eq!(record.slug, "naive-resume-tips");
    assert!(fixture.output_dir().join("naive-resume-tips.md").exists());
    assert!(MetadataStore::load(&fixture.store_path())
        .unwrap()
        .contains("naive-resume-tips"));
}

#[tokio::test]
async fn colliding_slug_with_existing_copy_replaces_record_then_conflicts() {
    let fixture = Fixture::new();
    fixture.seed(vec![existing("fox-facts", Genre::Opinion)]);
    let dest = fixture.output_dir().join("fox-facts.md");
    std::fs::write(&dest, "an older fox article").unwrap();
    let src = fixture.write_source(FOX_ARTICLE);

    let err = fixture
        .orchestrator(MockProvider::new(FOX_FIELDS, r#"{"related_articles":[]}"#))
        .run(&src)
        .await
        .unwrap_err();

    assert!(matches!(err, BrainiacError::FileConflict { .. }));
    // The older record is gone; the store now describes the new article
    let store = MetadataStore::load(&fixture.store_path()).unwrap();
    assert_eq!(store.len(), 1);
    let current = store.get("fox-facts").unwrap();
    assert_eq!(current.title, "Fox Facts");
    assert_eq!(current.author, "Ada Writer");
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "an older fox article");
}
