use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored document: searchable text fields plus the canonical record payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Attributes that take part in similarity search and filtering.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Canonical serialized record.
    pub payload: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
            payload,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Exact-match constraint on a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Similarity query against a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    /// Restrict matching to these fields; all fields when `None`.
    pub fields: Option<Vec<String>>,
    pub filters: Vec<FieldFilter>,
    pub limit: usize,
}

impl SearchQuery {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: None,
            filters: Vec::new(),
            limit: Self::DEFAULT_LIMIT,
        }
    }

    pub fn in_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FieldFilter::new(field, value));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub document: Document,
    pub score: f64,
}
