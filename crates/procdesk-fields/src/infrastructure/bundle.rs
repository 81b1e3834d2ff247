//! Form bundle
//!
//! A single JSON or YAML document carrying field definitions, sections,
//! sub-process names and reference tables. Serves both outbound ports, which
//! makes it the definition store of the command-line tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::persistence::{fields_in_scope, query_rows};
use crate::application::dto::{RequestContext, SubProcessRef};
use crate::domain::value_objects::{
    EntityId, FieldDefinition, FieldScope, LookupQuery, LookupRow, Section, SectionFilter,
};
use crate::ports::outbound::{FieldDefinitionSource, LookupSource, SourceError};
use crate::{FieldsError, Result};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormBundle {
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Display names of sub-processes
    #[serde(default)]
    pub sub_processes: Vec<SubProcessRef>,
    /// Reference tables by name
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<LookupRow>>,
}

impl FormBundle {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a bundle; `.yaml`/`.yml` files are read as YAML, anything else as JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let bundle = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text)?,
            _ => Self::from_json(&text)?,
        };
        tracing::debug!(
            "Loaded bundle {} with {} fields and {} tables",
            path.display(),
            bundle.fields.len(),
            bundle.tables.len()
        );
        Ok(bundle)
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id.as_str() == field_id)
    }

    /// Request context for a process and sub-process ids, named from the bundle
    pub fn context(&self, process_id: Option<&str>, sub_process_ids: &[String]) -> RequestContext {
        let sub_processes = sub_process_ids
            .iter()
            .map(|id| {
                let name = self
                    .sub_processes
                    .iter()
                    .find(|s| s.id.as_str() == id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| id.clone());
                SubProcessRef { id: EntityId::from_string(id.clone()), name }
            })
            .collect();
        RequestContext { process_id: process_id.map(EntityId::from), sub_processes }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(FieldsError::from)
    }
}

#[async_trait]
impl FieldDefinitionSource for FormBundle {
    async fn list_fields_by_scope(&self, scope: &FieldScope) -> std::result::Result<Vec<FieldDefinition>, SourceError> {
        Ok(fields_in_scope(&self.fields, scope))
    }

    async fn list_sections(&self, filter: &SectionFilter) -> std::result::Result<Vec<Section>, SourceError> {
        Ok(self.sections.iter().filter(|s| filter.matches(s)).cloned().collect())
    }
}

#[async_trait]
impl LookupSource for FormBundle {
    async fn list_lookup_rows(&self, query: &LookupQuery) -> std::result::Result<Vec<LookupRow>, SourceError> {
        let rows = self.tables.get(&query.table).ok_or_else(|| SourceError::UnknownTable(query.table.clone()))?;
        Ok(query_rows(rows, query))
    }
}
