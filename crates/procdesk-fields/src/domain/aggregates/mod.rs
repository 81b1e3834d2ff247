//! Aggregates module
//!
//! Stateful roots of the engine: the form session and its repeatable tables.

pub mod form_session;
pub mod repeatable_table;

pub use form_session::{FormSession, TouchState};
pub use repeatable_table::{ColumnKind, EffectiveColumn, RepeatableTable, TableError};
