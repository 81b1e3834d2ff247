//! Repeatable-table column definitions

use serde::{Deserialize, Serialize};

use super::{LookupBinding, SelectOption};

const DISPLAY_CELL_SEPARATOR: &str = "__";

/// Cell key holding a read-only value copied from a lookup row
pub fn display_cell_key(column_key: &str, display_column: &str) -> String {
    format!("{}{}{}", column_key, DISPLAY_CELL_SEPARATOR, display_column)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnInput {
    #[default]
    Text,
    Number,
    Select,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ColumnSource {
    /// User-typed cell
    Free {
        #[serde(default)]
        input: ColumnInput,
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    /// Searchable cell backed by a reference table
    Lookup(LookupBinding),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub source: ColumnSource,
}

impl ColumnDefinition {
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            source: ColumnSource::Free { input: ColumnInput::Text, options: vec![] },
        }
    }

    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            source: ColumnSource::Free { input: ColumnInput::Number, options: vec![] },
        }
    }

    pub fn lookup(key: impl Into<String>, label: impl Into<String>, binding: LookupBinding) -> Self {
        Self { key: key.into(), label: label.into(), source: ColumnSource::Lookup(binding) }
    }

    pub fn binding(&self) -> Option<&LookupBinding> {
        match &self.source {
            ColumnSource::Lookup(binding) => Some(binding),
            ColumnSource::Free { .. } => None,
        }
    }
}
