//! Domain Events
//!
//! Raised by form sessions and repeatable tables so that the rendering layer
//! can react to state changes without polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EntityId;

/// All domain events of the field engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "context", rename_all = "snake_case")]
pub enum DomainEvent {
    Session(SessionEvent),
    Table(TableEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Opened {
        session_id: EntityId,
        field_count: usize,
        opened_at: DateTime<Utc>,
    },

    AnswerChanged {
        session_id: EntityId,
        field_id: EntityId,
    },

    VisibilityChanged {
        session_id: EntityId,
        field_id: EntityId,
        visible: bool,
    },

    Touched {
        session_id: EntityId,
        field_id: EntityId,
    },

    Validated {
        session_id: EntityId,
        valid: bool,
        error_count: usize,
    },

    /// Scroll-into-view hint for the first invalid field
    FocusRequested {
        session_id: EntityId,
        field_id: EntityId,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TableEvent {
    RowAdded {
        field_id: EntityId,
        row_id: String,
    },

    RowRemoved {
        field_id: EntityId,
        row_id: String,
    },

    LookupApplied {
        field_id: EntityId,
        row_id: String,
        column_key: String,
        label: String,
        matched: bool,
    },
}
