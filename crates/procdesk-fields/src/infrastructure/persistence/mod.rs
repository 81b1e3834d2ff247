//! In-memory definition and lookup sources for testing and local runs

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::domain::value_objects::{FieldDefinition, FieldScope, LookupQuery, LookupRow, Section, SectionFilter};
use crate::ports::outbound::{FieldDefinitionSource, LookupSource, SourceError};

/// In-memory field and section store
#[derive(Default)]
pub struct InMemoryFieldSource {
    fields: RwLock<Vec<FieldDefinition>>,
    sections: RwLock<Vec<Section>>,
}

impl InMemoryFieldSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definitions(fields: Vec<FieldDefinition>, sections: Vec<Section>) -> Self {
        Self { fields: RwLock::new(fields), sections: RwLock::new(sections) }
    }

    pub fn add_field(&self, field: FieldDefinition) {
        self.fields.write().push(field);
    }

    pub fn add_section(&self, section: Section) {
        self.sections.write().push(section);
    }
}

#[async_trait]
impl FieldDefinitionSource for InMemoryFieldSource {
    async fn list_fields_by_scope(&self, scope: &FieldScope) -> Result<Vec<FieldDefinition>, SourceError> {
        Ok(fields_in_scope(&self.fields.read(), scope))
    }

    async fn list_sections(&self, filter: &SectionFilter) -> Result<Vec<Section>, SourceError> {
        Ok(self.sections.read().iter().filter(|s| filter.matches(s)).cloned().collect())
    }
}

/// In-memory reference tables
#[derive(Default)]
pub struct InMemoryLookupSource {
    tables: DashMap<String, Vec<LookupRow>>,
}

impl InMemoryLookupSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&self, table: impl Into<String>, rows: Vec<LookupRow>) {
        self.tables.insert(table.into(), rows);
    }
}

#[async_trait]
impl LookupSource for InMemoryLookupSource {
    async fn list_lookup_rows(&self, query: &LookupQuery) -> Result<Vec<LookupRow>, SourceError> {
        let rows = self.tables.get(&query.table).ok_or_else(|| SourceError::UnknownTable(query.table.clone()))?;
        Ok(query_rows(rows.value(), query))
    }
}

pub(crate) fn fields_in_scope(fields: &[FieldDefinition], scope: &FieldScope) -> Vec<FieldDefinition> {
    fields.iter().filter(|f| &f.scope == scope).cloned().collect()
}

/// Filter, order by label and project rows the way a table store would
pub(crate) fn query_rows(rows: &[LookupRow], query: &LookupQuery) -> Vec<LookupRow> {
    let filter = match (&query.filter_column, &query.filter_value) {
        (Some(column), Some(value)) => Some((column.as_str(), value.as_str())),
        _ => None,
    };

    let mut matched: Vec<&LookupRow> = rows
        .iter()
        .filter(|row| match filter {
            Some((column, value)) => row.get_text(column).as_deref() == Some(value),
            None => true,
        })
        .collect();
    matched.sort_by_key(|row| row.get_text(&query.label_column).unwrap_or_default());

    let columns: Vec<&str> = [query.value_column.as_str(), query.label_column.as_str()]
        .into_iter()
        .chain(query.display_columns.iter().map(String::as_str))
        .collect();

    matched
        .into_iter()
        .take(query.limit)
        .map(|row| {
            LookupRow::from_pairs(columns.iter().map(|c| (c.to_string(), row.value(c).cloned().unwrap_or_default())))
        })
        .collect()
}
