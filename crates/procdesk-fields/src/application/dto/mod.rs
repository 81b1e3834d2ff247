//! Data Transfer Objects (DTOs)

use serde::{Deserialize, Serialize};

use crate::domain::services::{OrganizedSection, ResolvedFields};
use crate::domain::value_objects::{EntityId, FieldDefinition, SectionFilter};

/// Sub-process selected on a request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProcessRef {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
}

impl SubProcessRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: EntityId::from_string(id), name: name.into() }
    }
}

/// Process and sub-processes a request is being filled for
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub process_id: Option<EntityId>,
    /// Active sub-processes, in display order
    #[serde(default)]
    pub sub_processes: Vec<SubProcessRef>,
}

impl RequestContext {
    pub fn for_process(process_id: impl Into<String>) -> Self {
        Self { process_id: Some(EntityId::from_string(process_id)), sub_processes: vec![] }
    }

    pub fn with_sub_process(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.sub_processes.push(SubProcessRef::new(id, name));
        self
    }

    pub fn active_sub_process_ids(&self) -> Vec<EntityId> {
        self.sub_processes.iter().map(|s| s.id.clone()).collect()
    }

    pub fn section_filter(&self) -> SectionFilter {
        SectionFilter { process_id: self.process_id.clone(), sub_process_ids: self.active_sub_process_ids() }
    }
}

/// Sections ready for display
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizedForm {
    pub sections: Vec<OrganizedSection>,
}

/// Resolved field set of a request context with its display sections
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssembledForm {
    pub context: RequestContext,
    pub resolved: ResolvedFields,
    pub organized: OrganizedForm,
}

impl AssembledForm {
    /// Every resolved field, section by section
    pub fn fields(&self) -> Vec<FieldDefinition> {
        self.organized.sections.iter().flat_map(|s| s.fields.iter().cloned()).collect()
    }
}
