//! Display sections

use serde::{Deserialize, Serialize};

use super::{EntityId, FieldScope};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: EntityId,
    pub label: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub scope: Option<FieldScope>,
}

impl Section {
    pub fn new(id: impl Into<String>, label: impl Into<String>, order: i32) -> Self {
        Self { id: EntityId::from_string(id), label: label.into(), order, scope: None }
    }

    pub fn in_scope(mut self, scope: FieldScope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Request context used to select the sections that apply
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFilter {
    pub process_id: Option<EntityId>,
    #[serde(default)]
    pub sub_process_ids: Vec<EntityId>,
}

impl SectionFilter {
    pub fn matches(&self, section: &Section) -> bool {
        match &section.scope {
            None | Some(FieldScope::Common) => true,
            Some(FieldScope::Process(id)) => self.process_id.as_ref() == Some(id),
            Some(FieldScope::SubProcess(id)) => self.sub_process_ids.contains(id),
        }
    }
}
