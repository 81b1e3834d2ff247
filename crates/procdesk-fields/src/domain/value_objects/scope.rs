//! Field Scope Value Object
//!
//! A field or section belongs to exactly one scope. The enum makes the
//! common / process / sub-process split mutually exclusive by construction.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EntityId;

/// Where a definition applies
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FieldScope {
    /// Applies to every request
    #[default]
    Common,
    /// Bound to a single process
    Process(EntityId),
    /// Bound to a single sub-process
    SubProcess(EntityId),
}

impl FieldScope {
    pub fn is_common(&self) -> bool {
        matches!(self, Self::Common)
    }

    pub fn process_id(&self) -> Option<&EntityId> {
        match self {
            Self::Process(id) => Some(id),
            _ => None,
        }
    }

    pub fn sub_process_id(&self) -> Option<&EntityId> {
        match self {
            Self::SubProcess(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for FieldScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "common"),
            Self::Process(id) => write!(f, "process:{}", id),
            Self::SubProcess(id) => write!(f, "sub_process:{}", id),
        }
    }
}
