//! Answer Value Objects
//!
//! Answers keyed by field id, in the shape persisted by the request store:
//! scalars, comma-joined multi-select strings, table rows and file
//! descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{EntityId, FieldDefinition, FieldType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl TableRow {
    pub fn new() -> Self {
        Self { id: uuid::Uuid::new_v4().to_string(), values: BTreeMap::new() }
    }

    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }
}

impl Default for TableRow {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Rows(Vec<TableRow>),
    File(FileDescriptor),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Multi-select answers travel as one comma-joined string
    pub fn from_selections<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        Self::Text(joined.join(","))
    }

    /// Empty answers fail a required check and never satisfy `not_empty`.
    /// Whitespace text and an unchecked box are answers.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) | Self::Number(_) => false,
            Self::Text(text) => text.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
            Self::File(file) => file.name.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Scalar rendering used for string comparisons
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null | Self::Rows(_) | Self::File(_) => None,
        }
    }

    pub fn selections(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => text.split(',').map(str::trim).filter(|s| !s.is_empty()).collect(),
            _ => vec![],
        }
    }

    pub fn rows(&self) -> Option<&[TableRow]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Typed initial answer for a field's authored default
    pub fn from_default(field: &FieldDefinition, raw: &str) -> Self {
        match field.field_type {
            FieldType::Checkbox => Self::Bool(matches!(raw.trim(), "true" | "1" | "yes")),
            FieldType::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Self::Number)
                .unwrap_or_else(|| Self::text(raw)),
            _ => Self::text(raw),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Current answers of one form session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerState(BTreeMap<EntityId, AnswerValue>);

impl AnswerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_id: &str) -> Option<&AnswerValue> {
        self.0.get(field_id)
    }

    /// Store an answer, returning the previous one
    pub fn set(&mut self, field_id: impl Into<EntityId>, value: AnswerValue) -> Option<AnswerValue> {
        self.0.insert(field_id.into(), value)
    }

    pub fn remove(&mut self, field_id: &str) -> Option<AnswerValue> {
        self.0.remove(field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.0.contains_key(field_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &AnswerValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Submission payload: field id to scalar, joined list, or row array
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

impl<K: Into<EntityId>> FromIterator<(K, AnswerValue)> for AnswerState {
    fn from_iter<T: IntoIterator<Item = (K, AnswerValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
