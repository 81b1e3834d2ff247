//! Outbound ports
//!
//! Collaborators the engine reads definitions and reference rows from.
//! Implementations own timeouts and retries; the engine only degrades a
//! failed call to an empty list.

use async_trait::async_trait;

use crate::domain::value_objects::{FieldDefinition, FieldScope, LookupQuery, LookupRow, Section, SectionFilter};

/// Field and section definition store
#[async_trait]
pub trait FieldDefinitionSource: Send + Sync {
    /// Fields attached to exactly this scope
    async fn list_fields_by_scope(&self, scope: &FieldScope) -> Result<Vec<FieldDefinition>, SourceError>;

    /// Sections applicable to a request context
    async fn list_sections(&self, filter: &SectionFilter) -> Result<Vec<Section>, SourceError>;
}

/// Reference-table rows for lookup fields and columns
#[async_trait]
pub trait LookupSource: Send + Sync {
    /// Rows ordered by the label column, at most `query.limit`
    async fn list_lookup_rows(&self, query: &LookupQuery) -> Result<Vec<LookupRow>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
