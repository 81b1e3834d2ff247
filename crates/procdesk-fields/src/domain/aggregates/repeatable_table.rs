//! Repeatable Table Aggregate
//!
//! Rows of a matrix field. Lookup-bound columns resolve their candidates
//! through the session's [`LookupCache`]; selecting a label copies the
//! configured display columns of the matching source row into read-only
//! synthetic cells.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::LookupCache;
use crate::domain::events::{DomainEvent, TableEvent};
use crate::domain::value_objects::{
    display_cell_key, AnswerValue, ColumnDefinition, ColumnSource, EntityId, FieldDefinition, LookupRow,
    SelectOption, TableRow,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Unknown row: {0}")]
    UnknownRow(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column {0} is filled from a lookup and cannot be edited")]
    ReadOnlyColumn(String),

    #[error("Column {0} is not bound to a lookup table")]
    NotLookupColumn(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free text, number or select cell
    Editable,
    /// Lookup cell searched by label
    Searchable,
    /// Value copied from the selected lookup row
    ReadOnly,
}

/// One column as displayed, after expanding lookup display columns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveColumn {
    pub key: String,
    pub label: String,
    pub kind: ColumnKind,
}

/// Repeatable table aggregate
#[derive(Clone, Debug)]
pub struct RepeatableTable {
    field_id: EntityId,
    columns: Vec<ColumnDefinition>,
    rows: Arc<Vec<TableRow>>,
    candidates: HashMap<String, Arc<Vec<LookupRow>>>,
    events: Vec<DomainEvent>,
}

impl RepeatableTable {
    pub fn new(field: &FieldDefinition) -> Self {
        Self {
            field_id: field.id.clone(),
            columns: field.columns.clone(),
            rows: Arc::new(Vec::new()),
            candidates: HashMap::new(),
            events: vec![],
        }
    }

    /// Rebuild from a persisted answer; anything but a row list starts empty
    pub fn from_answer(field: &FieldDefinition, answer: Option<&AnswerValue>) -> Self {
        let mut table = Self::new(field);
        if let Some(rows) = answer.and_then(AnswerValue::rows) {
            table.replace_rows(rows.to_vec());
        }
        table
    }

    pub fn field_id(&self) -> &EntityId {
        &self.field_id
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Snapshot of the current rows; later edits never alter a snapshot
    pub fn rows(&self) -> Arc<Vec<TableRow>> {
        self.rows.clone()
    }

    pub fn row(&self, row_id: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Swap in a whole row list; loaded lookup candidates are kept
    pub fn replace_rows(&mut self, rows: Vec<TableRow>) {
        self.rows = Arc::new(rows);
    }

    /// Append an empty row, returning its id
    pub fn add_row(&mut self) -> String {
        let row = TableRow::new();
        let row_id = row.id.clone();

        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.extend(self.rows.iter().cloned());
        rows.push(row);
        self.rows = Arc::new(rows);

        self.raise_event(TableEvent::RowAdded { field_id: self.field_id.clone(), row_id: row_id.clone() });
        row_id
    }

    /// Remove a row; returns false when no row has this id
    pub fn remove_row(&mut self, row_id: &str) -> bool {
        if self.row(row_id).is_none() {
            return false;
        }
        let rows: Vec<TableRow> = self.rows.iter().filter(|r| r.id != row_id).cloned().collect();
        self.rows = Arc::new(rows);

        self.raise_event(TableEvent::RowRemoved { field_id: self.field_id.clone(), row_id: row_id.to_string() });
        true
    }

    /// Edit one user-editable cell
    pub fn set_cell(&mut self, row_id: &str, column_key: &str, value: impl Into<String>) -> Result<(), TableError> {
        if self.column(column_key).is_none() {
            if self.is_synthetic_key(column_key) {
                return Err(TableError::ReadOnlyColumn(column_key.to_string()));
            }
            return Err(TableError::UnknownColumn(column_key.to_string()));
        }

        let value = value.into();
        self.update_row(row_id, |row| {
            row.values.insert(column_key.to_string(), value);
        })
    }

    /// Apply a label picked in a lookup column.
    ///
    /// The primary cell takes the label; every display column other than the
    /// label column is copied from the first candidate whose label matches,
    /// or cleared when none does.
    pub fn on_lookup_select(&mut self, row_id: &str, column_key: &str, label: &str) -> Result<(), TableError> {
        let binding = match self.column(column_key).map(|c| &c.source) {
            Some(ColumnSource::Lookup(binding)) => binding.clone(),
            Some(ColumnSource::Free { .. }) => return Err(TableError::NotLookupColumn(column_key.to_string())),
            None => return Err(TableError::UnknownColumn(column_key.to_string())),
        };

        let source = self.candidates.get(column_key).and_then(|rows| {
            rows.iter()
                .find(|row| row.get_text(&binding.label_column).as_deref() == Some(label))
                .cloned()
        });
        let matched = source.is_some();

        let mut cells = vec![(column_key.to_string(), label.to_string())];
        for display in binding.extra_display_columns() {
            let value = source.as_ref().and_then(|row| row.get_text(display)).unwrap_or_default();
            cells.push((display_cell_key(column_key, display), value));
        }

        self.update_row(row_id, |row| row.values.extend(cells))?;

        if !matched {
            tracing::debug!("No {} row labelled {:?}; display cells cleared", binding.table, label);
        }
        self.raise_event(TableEvent::LookupApplied {
            field_id: self.field_id.clone(),
            row_id: row_id.to_string(),
            column_key: column_key.to_string(),
            label: label.to_string(),
            matched,
        });
        Ok(())
    }

    // =========================================================================
    // Lookup candidates
    // =========================================================================

    /// Fetch candidate rows for every lookup column
    pub async fn load_lookups(&mut self, cache: &LookupCache) {
        let bound: Vec<(String, _)> = self
            .columns
            .iter()
            .filter_map(|c| c.binding().map(|b| (c.key.clone(), b.clone())))
            .collect();

        for (key, binding) in bound {
            let rows = cache.rows_for(&binding).await;
            self.candidates.insert(key, rows);
        }
    }

    pub fn set_candidates(&mut self, column_key: impl Into<String>, rows: Vec<LookupRow>) {
        self.candidates.insert(column_key.into(), Arc::new(rows));
    }

    pub fn candidates(&self, column_key: &str) -> &[LookupRow] {
        self.candidates.get(column_key).map(|rows| rows.as_slice()).unwrap_or(&[])
    }

    /// Label choices offered in a lookup column
    pub fn options(&self, column_key: &str) -> Vec<SelectOption> {
        let Some(binding) = self.column(column_key).and_then(ColumnDefinition::binding) else {
            return vec![];
        };
        self.candidates(column_key).iter().filter_map(|row| row.to_option(binding)).collect()
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Displayed columns: one per free column, and for a lookup column one
    /// searchable cell followed by one read-only cell per display column.
    pub fn effective_columns(&self) -> Vec<EffectiveColumn> {
        let mut out = Vec::new();
        for column in &self.columns {
            match &column.source {
                ColumnSource::Free { .. } => out.push(EffectiveColumn {
                    key: column.key.clone(),
                    label: column.label.clone(),
                    kind: ColumnKind::Editable,
                }),
                ColumnSource::Lookup(binding) => {
                    out.push(EffectiveColumn {
                        key: column.key.clone(),
                        label: column.label.clone(),
                        kind: ColumnKind::Searchable,
                    });
                    for display in binding.extra_display_columns() {
                        out.push(EffectiveColumn {
                            key: display_cell_key(&column.key, display),
                            label: display.to_string(),
                            kind: ColumnKind::ReadOnly,
                        });
                    }
                }
            }
        }
        out
    }

    /// Keys a user may type into; synthetic display cells are excluded
    pub fn editable_column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }

    pub fn to_answer(&self) -> AnswerValue {
        AnswerValue::Rows(self.rows.to_vec())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn column(&self, key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.key == key)
    }

    fn is_synthetic_key(&self, key: &str) -> bool {
        self.columns.iter().any(|c| {
            c.binding()
                .map(|b| b.extra_display_columns().iter().any(|d| display_cell_key(&c.key, d) == key))
                .unwrap_or(false)
        })
    }

    fn update_row(&mut self, row_id: &str, apply: impl FnOnce(&mut TableRow)) -> Result<(), TableError> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or_else(|| TableError::UnknownRow(row_id.to_string()))?;

        let mut rows = self.rows.to_vec();
        apply(&mut rows[index]);
        self.rows = Arc::new(rows);
        Ok(())
    }

    fn raise_event(&mut self, event: TableEvent) {
        self.events.push(DomainEvent::Table(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::value_objects::{FieldType, LookupBinding, LookupQuery};
    use crate::infrastructure::InMemoryLookupSource;

    fn supplier_binding() -> LookupBinding {
        LookupBinding::new("suppliers", "id", "name").with_display_columns(["name", "city", "vat"])
    }

    fn field() -> FieldDefinition {
        FieldDefinition::new("lines", "Order lines", FieldType::RepeatableTable).with_columns(vec![
            ColumnDefinition::lookup("supplier", "Supplier", supplier_binding()),
            ColumnDefinition::number("qty", "Qty"),
        ])
    }

    fn supplier_rows() -> Vec<LookupRow> {
        vec![
            LookupRow::from_pairs([
                ("id", serde_json::json!(1)),
                ("name", serde_json::json!("Acme")),
                ("city", serde_json::json!("Lyon")),
                ("vat", serde_json::json!(20)),
            ]),
            LookupRow::from_pairs([
                ("id", serde_json::json!(2)),
                ("name", serde_json::json!("Globex")),
                ("city", serde_json::Value::Null),
            ]),
        ]
    }

    #[test]
    fn test_add_and_remove_rows_replace_the_list() {
        let mut table = RepeatableTable::new(&field());
        let before = table.rows();
        let first = table.add_row();
        let second = table.add_row();
        assert_ne!(first, second);
        assert!(before.is_empty());
        assert_eq!(table.len(), 2);

        let snapshot = table.rows();
        assert!(table.remove_row(&first));
        assert!(!table.remove_row(&first));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(table.rows()[0].id, second);
        assert_eq!(table.take_events().len(), 3);
    }

    #[test]
    fn test_lookup_select_fills_display_cells() {
        let mut table = RepeatableTable::new(&field());
        table.set_candidates("supplier", supplier_rows());
        let row_id = table.add_row();

        table.on_lookup_select(&row_id, "supplier", "Acme").unwrap();
        let row = table.row(&row_id).unwrap();
        assert_eq!(row.get("supplier"), "Acme");
        assert_eq!(row.get("supplier__city"), "Lyon");
        assert_eq!(row.get("supplier__vat"), "20");
        assert!(!row.values.contains_key("supplier__name"));

        let editable = table.editable_column_keys();
        assert_eq!(editable, vec!["supplier", "qty"]);
        assert!(row.values.keys().filter(|k| k.contains("__")).all(|k| !editable.contains(&k.as_str())));
    }

    #[test]
    fn test_null_and_unmatched_display_values_are_empty() {
        let mut table = RepeatableTable::new(&field());
        table.set_candidates("supplier", supplier_rows());
        let row_id = table.add_row();

        table.on_lookup_select(&row_id, "supplier", "Acme").unwrap();
        table.on_lookup_select(&row_id, "supplier", "Globex").unwrap();
        let row = table.row(&row_id).unwrap();
        assert_eq!(row.get("supplier__city"), "");
        assert_eq!(row.get("supplier__vat"), "");

        table.on_lookup_select(&row_id, "supplier", "Initech").unwrap();
        assert_eq!(table.row(&row_id).unwrap().get("supplier"), "Initech");
        let last = table.take_events().pop();
        assert!(matches!(last, Some(DomainEvent::Table(TableEvent::LookupApplied { matched: false, .. }))));
    }

    #[test]
    fn test_cell_edits() {
        let mut table = RepeatableTable::new(&field());
        let row_id = table.add_row();

        table.set_cell(&row_id, "qty", "3").unwrap();
        assert_eq!(table.row(&row_id).unwrap().get("qty"), "3");
        assert_eq!(
            table.set_cell(&row_id, "supplier__city", "Paris"),
            Err(TableError::ReadOnlyColumn("supplier__city".into()))
        );
        assert_eq!(table.set_cell(&row_id, "nope", "x"), Err(TableError::UnknownColumn("nope".into())));
        assert_eq!(table.set_cell("ghost", "qty", "1"), Err(TableError::UnknownRow("ghost".into())));
        assert_eq!(
            table.on_lookup_select(&row_id, "qty", "Acme"),
            Err(TableError::NotLookupColumn("qty".into()))
        );
    }

    #[test]
    fn test_effective_columns() {
        let table = RepeatableTable::new(&field());
        let columns: Vec<_> = table.effective_columns().into_iter().map(|c| (c.key, c.kind)).collect();
        assert_eq!(
            columns,
            vec![
                ("supplier".to_string(), ColumnKind::Searchable),
                ("supplier__city".to_string(), ColumnKind::ReadOnly),
                ("supplier__vat".to_string(), ColumnKind::ReadOnly),
                ("qty".to_string(), ColumnKind::Editable),
            ]
        );
    }

    #[test]
    fn test_answer_round_trip_keeps_rows() {
        let mut table = RepeatableTable::new(&field());
        let row_id = table.add_row();
        table.set_cell(&row_id, "qty", "7").unwrap();

        let restored = RepeatableTable::from_answer(&field(), Some(&table.to_answer()));
        assert_eq!(restored.row(&row_id).map(|r| r.get("qty")), Some("7"));
        assert!(RepeatableTable::from_answer(&field(), Some(&AnswerValue::text("x"))).is_empty());
    }

    #[tokio::test]
    async fn test_candidates_loaded_through_cache() {
        let source = InMemoryLookupSource::new();
        source.insert_table("suppliers", supplier_rows());
        let cache = LookupCache::new(std::sync::Arc::new(source), &EngineConfig::default());

        let mut table = RepeatableTable::new(&field());
        table.load_lookups(&cache).await;
        assert_eq!(table.candidates("supplier").len(), 2);
        assert_eq!(table.options("supplier")[0], SelectOption::new("1", "Acme"));
        assert!(table.options("qty").is_empty());

        let query = LookupQuery::from_binding(&supplier_binding(), 500);
        assert_eq!(query.display_columns, vec!["city", "vat"]);
    }

    proptest::proptest! {
        #[test]
        fn prop_display_cells_follow_selected_row(city in "[A-Za-z]{1,10}", label in "[A-Za-z]{1,10}") {
            let mut table = RepeatableTable::new(&field());
            table.set_candidates("supplier", vec![LookupRow::from_pairs([
                ("id", serde_json::json!("x")),
                ("name", serde_json::json!(label.clone())),
                ("city", serde_json::json!(city.clone())),
            ])]);
            let row_id = table.add_row();
            table.on_lookup_select(&row_id, "supplier", &label).unwrap();
            let row = table.row(&row_id).unwrap();
            proptest::prop_assert_eq!(row.get("supplier"), label.as_str());
            proptest::prop_assert_eq!(row.get("supplier__city"), city.as_str());
        }
    }
}
