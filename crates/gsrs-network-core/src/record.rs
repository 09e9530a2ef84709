//! Raw substance records and the read-only store that indexes them by id.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NetworkError, Result};
use crate::path::JsonPath;
use crate::query;

/// Field holding a record's unique id.
pub const ID_FIELD: &str = "uuid";

pub const DEFAULT_REFERENCE_FIELD: &str = "refuuid";

/// How references are located inside each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOptions {
    /// Field whose presence marks an object as a reference to another record.
    pub reference_field: String,
    /// Top-level sections that make up the reference sub-document.
    /// Empty means the whole record is scanned.
    pub reference_sections: Vec<String>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            reference_field: DEFAULT_REFERENCE_FIELD.to_string(),
            reference_sections: vec!["relationships".to_string()],
        }
    }
}

/// One catalog entry plus the sub-document its references are read from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    id: String,
    document: Value,
    /// `None` when the whole document is the reference scope.
    references: Option<Value>,
}

impl RawRecord {
    pub fn from_value(document: Value, options: &RecordOptions) -> Result<Self> {
        let object = document.as_object().ok_or(NetworkError::InvalidRecord)?;
        let id = object
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or(NetworkError::MissingId { field: ID_FIELD })?
            .to_string();

        let references = if options.reference_sections.is_empty() {
            None
        } else {
            let mut sections = Map::new();
            for name in &options.reference_sections {
                if let Some(section) = object.get(name) {
                    sections.insert(name.clone(), section.clone());
                }
            }
            Some(Value::Object(sections))
        };

        Ok(Self {
            id,
            document,
            references,
        })
    }

    pub fn from_json(text: &str, options: &RecordOptions) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value, options)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The reference sub-document. Paths into it are also valid paths into
    /// the full document because sections keep their top-level names.
    pub fn references(&self) -> &Value {
        self.references.as_ref().unwrap_or(&self.document)
    }

    pub fn reference_paths(&self, field: &str) -> Vec<JsonPath> {
        query::reference_paths(self.references(), field)
    }

    pub fn reference_target(&self, path: &JsonPath, field: &str) -> Option<&str> {
        query::reference_id(self.references(), path, field)
    }
}

/// Insertion-ordered, read-only index of every record in a dump.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    options: RecordOptions,
    records: IndexMap<String, RawRecord>,
}

impl RecordStore {
    pub fn new(options: RecordOptions) -> Self {
        Self {
            options,
            records: IndexMap::new(),
        }
    }

    pub fn from_records(options: RecordOptions, records: impl IntoIterator<Item = RawRecord>) -> Self {
        let mut store = Self::new(options);
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Builds a store from JSON documents, rejecting the first malformed one.
    pub fn from_values(options: RecordOptions, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let mut store = Self::new(options);
        for value in values {
            let record = RawRecord::from_value(value, &store.options)?;
            store.insert(record);
        }
        Ok(store)
    }

    /// Adds a record. A duplicate id replaces the earlier record but keeps
    /// its position.
    pub fn insert(&mut self, record: RawRecord) -> Option<RawRecord> {
        self.records.insert(record.id.clone(), record)
    }

    pub fn options(&self) -> &RecordOptions {
        &self.options
    }

    pub fn reference_field(&self) -> &str {
        &self.options.reference_field
    }

    pub fn get(&self, id: &str) -> Option<&RawRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawRecord> {
        self.records.values()
    }
}
