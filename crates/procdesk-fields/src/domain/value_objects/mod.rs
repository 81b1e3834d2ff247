//! Value Objects module
//!
//! Immutable definitions and answer primitives the engine evaluates.

pub mod answer;
pub mod column;
pub mod field;
pub mod lookup;
pub mod scope;
pub mod section;

pub use answer::{AnswerState, AnswerValue, FileDescriptor, TableRow};
pub use column::{display_cell_key, ColumnDefinition, ColumnInput, ColumnSource};
pub use field::{
    ConditionOperator, FieldDefinition, FieldType, LookupBinding, RuleKind, SelectOption,
    ValidationRule, VisibilityCondition,
};
pub use lookup::{LookupKey, LookupQuery, LookupRow};
pub use scope::FieldScope;
pub use section::{Section, SectionFilter};

/// Identifier value object for fields, sections, processes and sessions
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
