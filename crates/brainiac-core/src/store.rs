// ABOUTME: JSON-backed aggregate of article metadata keyed by slug
// ABOUTME: Load/push/persist with atomic replacement and order-preserving serialization

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{BrainiacError, Result};
use crate::files::{read_file, write_atomic};
use crate::model::{ArticleSummary, MetadataRecord};

/// All stored article metadata, in insertion order, one record per slug.
///
/// Persisted as `{"metadata": {<slug>: <record>, ...}}`. Unknown top-level
/// keys are carried through unchanged so a newer file is not truncated by an
/// older binary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    records: Vec<MetadataRecord>,
    /// Slug to position in `records`
    index: HashMap<String, usize>,
    extra: Map<String, Value>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store at `path`, or an empty store if nothing exists there
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No metadata store found, starting empty");
            return Ok(Self::new());
        }

        let content = read_file(path)?;
        let store = Self::from_json(&content).map_err(|reason| BrainiacError::CorruptStore {
            path: path.to_path_buf(),
            reason,
        })?;

        info!(
            path = %path.display(),
            records = store.len(),
            "Loaded metadata store"
        );
        Ok(store)
    }

    fn from_json(content: &str) -> std::result::Result<Self, String> {
        let file: StoreFile = serde_json::from_str(content).map_err(|e| e.to_string())?;

        let mut store = Self {
            extra: file.extra,
            ..Self::default()
        };
        for (key, record) in file.metadata.0 {
            if key != record.slug {
                return Err(format!(
                    "entry '{}' holds a record with slug '{}'",
                    key, record.slug
                ));
            }
            store.index.insert(key, store.records.len());
            store.records.push(record);
        }

        Ok(store)
    }

    /// Insert `record` under its slug, replacing any record with the same slug.
    ///
    /// Returns the replaced record, if any.
    pub fn push(&mut self, record: MetadataRecord) -> Option<MetadataRecord> {
        if record.references_itself() {
            warn!(slug = %record.slug, "Record lists itself as a related article");
        }

        match self.index.get(&record.slug).copied() {
            Some(position) => {
                warn!(slug = %record.slug, "Replacing existing metadata record");
                Some(std::mem::replace(&mut self.records[position], record))
            }
            None => {
                debug!(slug = %record.slug, "Adding metadata record");
                self.index.insert(record.slug.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    /// Serialize the full store and atomically replace the file at `path`
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        write_atomic(path, json.as_bytes())?;
        info!(
            path = %path.display(),
            records = self.len(),
            "Persisted metadata store"
        );
        Ok(())
    }

    /// Pretty JSON with two-space indentation, records in insertion order
    pub fn to_json_pretty(&self) -> Result<String> {
        let file = StoreFileRef {
            metadata: RecordsRef(&self.records),
            extra: &self.extra,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Project every record to the fields the relatedness resolver needs
    pub fn to_aggregate_view(&self) -> Vec<ArticleSummary> {
        self.records.iter().map(MetadataRecord::summary).collect()
    }

    pub fn get(&self, slug: &str) -> Option<&MetadataRecord> {
        self.index.get(slug).map(|&position| &self.records[position])
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.index.contains_key(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    metadata: RecordsRef<'a>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct StoreFile {
    metadata: RecordEntries,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

struct RecordsRef<'a>(&'a [MetadataRecord]);

impl Serialize for RecordsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|r| (&r.slug, r)))
    }
}

/// `metadata` entries in file order; duplicate keys are rejected
struct RecordEntries(Vec<(String, MetadataRecord)>);

impl<'de> Deserialize<'de> for RecordEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RecordEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of slug to metadata record")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let capacity = map.size_hint().unwrap_or(0);
                let mut entries: Vec<(String, MetadataRecord)> = Vec::with_capacity(capacity);
                let mut seen: HashSet<String> = HashSet::with_capacity(capacity);
                while let Some((key, record)) = map.next_entry::<String, MetadataRecord>()? {
                    if !seen.insert(key.clone()) {
                        return Err(de::Error::custom(format!("duplicate slug '{}'", key)));
                    }
                    entries.push((key, record));
                }
                Ok(RecordEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
