//! Reference-table lookup rows and query keys

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{LookupBinding, SelectOption};

/// One row returned by the reference-table collaborator
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupRow(serde_json::Map<String, serde_json::Value>);

impl LookupRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Column value rendered as a string; null and missing columns read as `None`
    pub fn get_text(&self, column: &str) -> Option<String> {
        match self.0.get(column)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn value(&self, column: &str) -> Option<&serde_json::Value> {
        self.0.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_option(&self, binding: &LookupBinding) -> Option<SelectOption> {
        let label = self.get_text(&binding.label_column)?;
        let value = self.get_text(&binding.value_column).unwrap_or_else(|| label.clone());
        Some(SelectOption { value, label })
    }
}

/// Request sent to the reference-table collaborator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub table: String,
    pub value_column: String,
    pub label_column: String,
    pub display_columns: Vec<String>,
    pub filter_column: Option<String>,
    pub filter_value: Option<String>,
    pub limit: usize,
}

impl LookupQuery {
    pub fn from_binding(binding: &LookupBinding, limit: usize) -> Self {
        let (filter_column, filter_value) = match binding.filter() {
            Some((column, value)) => (Some(column.to_string()), Some(value.to_string())),
            None => (None, None),
        };
        Self {
            table: binding.table.clone(),
            value_column: binding.value_column.clone(),
            label_column: binding.label_column.clone(),
            display_columns: binding.extra_display_columns().into_iter().map(str::to_string).collect(),
            filter_column,
            filter_value,
            limit,
        }
    }
}

/// Cache identity of a lookup: table, column set and filter
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub table: String,
    pub value_column: String,
    pub label_column: String,
    pub display_columns: BTreeSet<String>,
    pub filter: Option<(String, String)>,
}

impl From<&LookupBinding> for LookupKey {
    fn from(binding: &LookupBinding) -> Self {
        Self {
            table: binding.table.clone(),
            value_column: binding.value_column.clone(),
            label_column: binding.label_column.clone(),
            display_columns: binding.extra_display_columns().into_iter().map(str::to_string).collect(),
            filter: binding.filter().map(|(c, v)| (c.to_string(), v.to_string())),
        }
    }
}
