//! Form Session Aggregate
//!
//! Owns the answers of one form while it is being filled: recomputes
//! visibility after every change, validates on change, blur and submit, and
//! gates messages on the touched state of each field.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::cache::LookupCache;
use crate::config::EngineConfig;
use crate::domain::aggregates::RepeatableTable;
use crate::domain::events::{DomainEvent, SessionEvent};
use crate::domain::services::{ConditionEvaluator, FieldValidator, FormValidation, ValidationResult};
use crate::domain::value_objects::{AnswerState, AnswerValue, EntityId, FieldDefinition, FieldType, SelectOption};
use crate::{FieldsError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchState {
    Untouched,
    Touched,
}

pub struct FormSession {
    id: EntityId,
    fields: Vec<FieldDefinition>,
    answers: AnswerState,
    touched: HashSet<EntityId>,
    results: HashMap<EntityId, ValidationResult>,
    visibility: HashMap<EntityId, bool>,
    tables: HashMap<EntityId, RepeatableTable>,
    lookup_options: HashMap<EntityId, Vec<SelectOption>>,
    evaluator: ConditionEvaluator,
    validator: FieldValidator,
    validate_on_change: bool,
    events: Vec<DomainEvent>,
}

impl FormSession {
    /// Open a session over `fields` (display order), seeded with prior answers.
    ///
    /// Fields without a prior answer take their default value.
    pub fn open(fields: Vec<FieldDefinition>, mut answers: AnswerState, config: &EngineConfig) -> Self {
        for field in &fields {
            if answers.contains(field.id.as_str()) || field.field_type == FieldType::RepeatableTable {
                continue;
            }
            if let Some(raw) = &field.default_value {
                answers.set(field.id.clone(), AnswerValue::from_default(field, raw));
            }
        }

        let tables = fields
            .iter()
            .filter(|f| f.field_type == FieldType::RepeatableTable)
            .map(|f| (f.id.clone(), RepeatableTable::from_answer(f, answers.get(f.id.as_str()))))
            .collect();

        let mut session = Self {
            id: EntityId::new(),
            evaluator: ConditionEvaluator::for_fields(&fields),
            fields,
            answers,
            touched: HashSet::new(),
            results: HashMap::new(),
            visibility: HashMap::new(),
            tables,
            lookup_options: HashMap::new(),
            validator: FieldValidator::new(),
            validate_on_change: config.validate_on_change,
            events: vec![],
        };

        for field in &session.fields {
            let visible = session.evaluator.is_visible(field, &session.answers);
            session.visibility.insert(field.id.clone(), visible);
        }

        tracing::info!("Opened form session {} with {} fields", session.id, session.fields.len());
        session.raise_event(SessionEvent::Opened {
            session_id: session.id.clone(),
            field_count: session.fields.len(),
            opened_at: Utc::now(),
        });
        session
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id.as_str() == field_id)
    }

    pub fn answers(&self) -> &AnswerState {
        &self.answers
    }

    pub fn answer(&self, field_id: &str) -> Option<&AnswerValue> {
        self.answers.get(field_id)
    }

    /// Unknown fields are reported hidden
    pub fn is_visible(&self, field_id: &str) -> bool {
        self.visibility.get(field_id).copied().unwrap_or(false)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| self.is_visible(f.id.as_str()))
    }

    pub fn touch_state(&self, field_id: &str) -> TouchState {
        if self.touched.contains(field_id) {
            TouchState::Touched
        } else {
            TouchState::Untouched
        }
    }

    pub fn result(&self, field_id: &str) -> Option<&ValidationResult> {
        self.results.get(field_id)
    }

    /// Message to show under a field: only for touched, visible, invalid fields
    pub fn message(&self, field_id: &str) -> Option<&str> {
        if !self.touched.contains(field_id) || !self.is_visible(field_id) {
            return None;
        }
        self.results.get(field_id).and_then(|r| r.message.as_deref())
    }

    /// Choices for select and external-table fields
    pub fn options(&self, field_id: &str) -> Vec<SelectOption> {
        match self.field(field_id) {
            Some(field) if field.field_type == FieldType::ExternalTable => {
                self.lookup_options.get(field_id).cloned().unwrap_or_default()
            }
            Some(field) => field.options.clone(),
            None => vec![],
        }
    }

    pub fn table(&self, field_id: &str) -> Option<&RepeatableTable> {
        self.tables.get(field_id)
    }

    /// Submission payload in the persisted answer shape
    pub fn payload(&self) -> serde_json::Value {
        self.answers.to_payload()
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Store an answer, rescan visibility and, when enabled, re-validate it
    pub fn set_answer(&mut self, field_id: &str, value: AnswerValue) -> Result<()> {
        let field = self.field(field_id).cloned().ok_or_else(|| FieldsError::UnknownField(field_id.to_string()))?;

        if field.field_type == FieldType::RepeatableTable {
            let rows = value.rows().map(|rows| rows.to_vec()).unwrap_or_default();
            match self.tables.get_mut(field_id) {
                Some(table) => table.replace_rows(rows),
                None => {
                    self.tables.insert(field.id.clone(), RepeatableTable::from_answer(&field, Some(&value)));
                }
            }
        }
        self.commit(&field, value);
        Ok(())
    }

    /// Mark a field touched and validate it
    pub fn blur(&mut self, field_id: &str) -> Result<ValidationResult> {
        let field = self.field(field_id).cloned().ok_or_else(|| FieldsError::UnknownField(field_id.to_string()))?;

        if self.touched.insert(field.id.clone()) {
            self.raise_event(SessionEvent::Touched { session_id: self.id.clone(), field_id: field.id.clone() });
        }
        Ok(self.validate_field(&field))
    }

    /// Validate every visible field and mark all fields touched.
    ///
    /// Raises `FocusRequested` for the first invalid field.
    pub fn validate_all(&mut self) -> FormValidation {
        let fields = self.fields.clone();
        for field in &fields {
            self.touched.insert(field.id.clone());
            if self.is_visible(field.id.as_str()) {
                self.validate_field(field);
            } else {
                self.results.remove(field.id.as_str());
            }
        }

        let outcome = FormValidation::collect(
            self.fields
                .iter()
                .filter_map(|f| self.results.get(f.id.as_str()).map(|r| (&f.id, r))),
        );

        tracing::info!("Session {} validated: {} errors", self.id, outcome.errors.len());
        self.raise_event(SessionEvent::Validated {
            session_id: self.id.clone(),
            valid: outcome.valid,
            error_count: outcome.errors.len(),
        });
        if let Some(field_id) = &outcome.first_invalid {
            self.raise_event(SessionEvent::FocusRequested { session_id: self.id.clone(), field_id: field_id.clone() });
        }
        outcome
    }

    /// Fetch options for external-table fields and candidates for table columns
    pub async fn load_lookups(&mut self, cache: &LookupCache) {
        for field in &self.fields {
            if field.field_type != FieldType::ExternalTable {
                continue;
            }
            if let Some(binding) = &field.lookup {
                let options = cache.options_for(binding).await;
                self.lookup_options.insert(field.id.clone(), options);
            }
        }
        for table in self.tables.values_mut() {
            table.load_lookups(cache).await;
        }
    }

    // =========================================================================
    // Repeatable tables
    // =========================================================================

    pub fn add_row(&mut self, field_id: &str) -> Result<String> {
        self.with_table(field_id, |table| Ok(table.add_row()))
    }

    pub fn remove_row(&mut self, field_id: &str, row_id: &str) -> Result<bool> {
        self.with_table(field_id, |table| Ok(table.remove_row(row_id)))
    }

    pub fn set_cell(&mut self, field_id: &str, row_id: &str, column_key: &str, value: &str) -> Result<()> {
        self.with_table(field_id, |table| Ok(table.set_cell(row_id, column_key, value)?))
    }

    pub fn select_lookup(&mut self, field_id: &str, row_id: &str, column_key: &str, label: &str) -> Result<()> {
        self.with_table(field_id, |table| Ok(table.on_lookup_select(row_id, column_key, label)?))
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn with_table<T>(&mut self, field_id: &str, apply: impl FnOnce(&mut RepeatableTable) -> Result<T>) -> Result<T> {
        let field = self.field(field_id).cloned().ok_or_else(|| FieldsError::UnknownField(field_id.to_string()))?;
        let table = self.tables.get_mut(field_id).ok_or_else(|| FieldsError::NotATable(field_id.to_string()))?;

        let out = apply(table)?;
        let answer = table.to_answer();
        self.events.extend(table.take_events());

        self.commit(&field, answer);
        Ok(out)
    }

    fn commit(&mut self, field: &FieldDefinition, value: AnswerValue) {
        self.answers.set(field.id.clone(), value);
        self.raise_event(SessionEvent::AnswerChanged { session_id: self.id.clone(), field_id: field.id.clone() });

        self.refresh_visibility(field.id.as_str());
        if self.validate_on_change {
            self.validate_field(field);
        }
    }

    /// Re-evaluate the fields whose condition reads `changed_id`
    fn refresh_visibility(&mut self, changed_id: &str) {
        let mut changed = Vec::new();
        for field in self.evaluator.dependents(changed_id, &self.fields) {
            let visible = self.evaluator.is_visible(field, &self.answers);
            if self.visibility.insert(field.id.clone(), visible) != Some(visible) {
                changed.push((field.clone(), visible));
            }
        }

        for (field, visible) in changed {
            tracing::debug!("Field {} is now {}", field.id, if visible { "visible" } else { "hidden" });
            if !visible {
                self.results.remove(field.id.as_str());
            } else if self.validate_on_change || self.touched.contains(field.id.as_str()) {
                self.validate_field(&field);
            }
            self.raise_event(SessionEvent::VisibilityChanged {
                session_id: self.id.clone(),
                field_id: field.id.clone(),
                visible,
            });
        }
    }

    /// Hidden fields always pass and keep their answer
    fn validate_field(&mut self, field: &FieldDefinition) -> ValidationResult {
        let result = if self.is_visible(field.id.as_str()) {
            self.validator.validate(self.answers.get(field.id.as_str()), field)
        } else {
            ValidationResult::ok()
        };
        self.results.insert(field.id.clone(), result.clone());
        result
    }

    fn raise_event(&mut self, event: SessionEvent) {
        self.events.push(DomainEvent::Session(event));
    }
}
