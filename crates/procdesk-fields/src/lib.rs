//! procdesk custom-field engine
//!
//! Turns field definitions and user answers into a validated, organized,
//! displayable answer set for process requests.
//!
//! ## Architecture
//!
//! - **Domain Layer**: field value objects, evaluation services, the form
//!   session and repeatable-table aggregates, session events
//! - **Application Layer**: form assembly for a request context
//! - **Ports Layer**: definition and lookup sources
//! - **Infrastructure Layer**: in-memory sources and file bundles
//!
//! ## Features
//!
//! - Scope resolution across common, process and sub-process fields
//! - Section grouping with a synthesized default section
//! - Conditional visibility that fails open on bad configuration
//! - Per-type, range, length and pattern validation
//! - Repeatable tables with lookup-bound columns and auto-filled display cells
//! - Session-scoped lookup cache

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

use thiserror::Error;

pub use application::{AssembledForm, FormAssemblyService, OrganizedForm, RequestContext, SubProcessRef};
pub use cache::LookupCache;
pub use config::EngineConfig;
pub use domain::aggregates::{FormSession, RepeatableTable, TableError, TouchState};
pub use domain::events::{DomainEvent, SessionEvent, TableEvent};
pub use domain::services::{
    validate_all, ConditionEvaluator, FieldValidator, FormValidation, OrganizedSection, ResolvedFields,
    ScopeResolver, SectionKind, SectionOrganizer, ValidationIssue, ValidationResult,
};
pub use domain::value_objects::{
    AnswerState, AnswerValue, ColumnDefinition, EntityId, FieldDefinition, FieldScope, FieldType, LookupBinding,
    LookupRow, Section, TableRow,
};
pub use infrastructure::{FormBundle, InMemoryFieldSource, InMemoryLookupSource};
pub use ports::inbound::{FormAssemblyUseCases, UseCaseError};
pub use ports::outbound::{FieldDefinitionSource, LookupSource, SourceError};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum FieldsError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {0} is not a repeatable table")]
    NotATable(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    UseCase(#[from] UseCaseError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FieldsError>;
