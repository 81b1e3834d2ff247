//! Field Definition Value Objects
//!
//! Authored definitions loaded from the field store. Everything here is
//! normalized once at load time (options, operators, rule kinds) so the
//! evaluators never re-interpret raw configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ColumnDefinition, EntityId, FieldScope};

// =============================================================================
// Field Type
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    ShortText,
    LongText,
    Number,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Email,
    Phone,
    Url,
    Checkbox,
    SingleSelect,
    MultiSelect,
    Person,
    Department,
    File,
    ExternalTable,
    RepeatableTable,
}

impl FieldType {
    /// Type rule implied by the field type alone
    pub fn implied_rule(&self) -> Option<RuleKind> {
        match self {
            Self::Email => Some(RuleKind::Email),
            Self::Url => Some(RuleKind::Url),
            Self::Number => Some(RuleKind::Number),
            Self::Phone => Some(RuleKind::Phone),
            Self::Date => Some(RuleKind::Date),
            Self::DateTime => Some(RuleKind::DateTime),
            _ => None,
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect | Self::ExternalTable)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::Number => "number",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::Checkbox => "checkbox",
            Self::SingleSelect => "single_select",
            Self::MultiSelect => "multi_select",
            Self::Person => "person",
            Self::Department => "department",
            Self::File => "file",
            Self::ExternalTable => "external_table",
            Self::RepeatableTable => "repeatable_table",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Select Options
// =============================================================================

/// Normalized select option
///
/// Authored option lists mix bare strings and `{value, label}` objects; both
/// collapse into this shape during deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self { label: value.clone(), value }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Labeled { value: String, label: Option<String> },
}

impl From<RawOption> for SelectOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Plain(value) => Self::plain(value),
            RawOption::Labeled { value, label } => {
                let label = label.unwrap_or_else(|| value.clone());
                Self { value, label }
            }
        }
    }
}

// =============================================================================
// Visibility Condition
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotEmpty,
    /// Anything else an administrator typed; evaluates as visible
    Unknown(String),
}

impl From<String> for ConditionOperator {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_empty" => Self::NotEmpty,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => write!(f, "equals"),
            Self::NotEquals => write!(f, "not_equals"),
            Self::Contains => write!(f, "contains"),
            Self::NotEmpty => write!(f, "not_empty"),
            Self::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityCondition {
    pub field_id: EntityId,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Option<String>,
}

// =============================================================================
// Validation Rule
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    Email,
    Url,
    Phone,
    Number,
    Date,
    DateTime,
    /// Unrecognized kind; the field type decides the type rule
    Other(String),
}

impl From<String> for RuleKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "url" => Self::Url,
            "phone" => Self::Phone,
            "number" => Self::Number,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            _ => Self::Other(raw),
        }
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        match kind {
            RuleKind::Email => "email".into(),
            RuleKind::Url => "url".into(),
            RuleKind::Phone => "phone".into(),
            RuleKind::Number => "number".into(),
            RuleKind::Date => "date".into(),
            RuleKind::DateTime => "datetime".into(),
            RuleKind::Other(raw) => raw,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default, rename = "type")]
    pub kind: Option<RuleKind>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Regular expression the answer must match
    #[serde(default)]
    pub pattern: Option<String>,
    /// Replaces the default pattern-mismatch message
    #[serde(default)]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min_value: min, max_value: max, ..Default::default() }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self { pattern: Some(pattern.into()), ..Default::default() }
    }
}

// =============================================================================
// Lookup Binding
// =============================================================================

/// Binding of a field or column to an external reference table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupBinding {
    pub table: String,
    pub value_column: String,
    pub label_column: String,
    #[serde(default)]
    pub display_columns: Vec<String>,
    #[serde(default)]
    pub filter_column: Option<String>,
    #[serde(default)]
    pub filter_value: Option<String>,
}

impl LookupBinding {
    pub fn new(
        table: impl Into<String>,
        value_column: impl Into<String>,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            value_column: value_column.into(),
            label_column: label_column.into(),
            display_columns: vec![],
            filter_column: None,
            filter_value: None,
        }
    }

    pub fn with_display_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.display_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter_column = Some(column.into());
        self.filter_value = Some(value.into());
        self
    }

    /// Display columns surfaced as read-only cells; the label column is
    /// merged into the searchable cell and never repeated here.
    pub fn extra_display_columns(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for column in &self.display_columns {
            if column != &self.label_column && !seen.contains(&column.as_str()) {
                seen.push(column.as_str());
            }
        }
        seen
    }

    /// Filter applies only when both column and value are configured
    pub fn filter(&self) -> Option<(&str, &str)> {
        match (&self.filter_column, &self.filter_value) {
            (Some(column), Some(value)) => Some((column.as_str(), value.as_str())),
            _ => None,
        }
    }
}

// =============================================================================
// Field Definition
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: EntityId,
    /// Technical name
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scope: FieldScope,
    #[serde(default)]
    pub section_id: Option<EntityId>,
    #[serde(default)]
    pub condition: Option<VisibilityCondition>,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    /// Reference table for external-table fields
    #[serde(default)]
    pub lookup: Option<LookupBinding>,
    /// Column layout for repeatable-table fields
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub validation: Option<ValidationRule>,
}

impl FieldDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: EntityId::from_string(id),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
            default_value: None,
            order: 0,
            description: None,
            scope: FieldScope::Common,
            section_id: None,
            condition: None,
            options: vec![],
            lookup: None,
            columns: vec![],
            validation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn in_scope(mut self, scope: FieldScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn in_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(EntityId::from_string(section_id));
        self
    }

    pub fn visible_when(
        mut self,
        field_id: impl Into<String>,
        operator: ConditionOperator,
        value: Option<&str>,
    ) -> Self {
        self.condition = Some(VisibilityCondition {
            field_id: EntityId::from_string(field_id),
            operator,
            value: value.map(str::to_string),
        });
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(SelectOption::plain).collect();
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validation = Some(rule);
        self
    }

    pub fn with_lookup(mut self, binding: LookupBinding) -> Self {
        self.lookup = Some(binding);
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDefinition>) -> Self {
        self.columns = columns;
        self
    }

    /// Type rule in force: an explicit rule kind wins over the field type
    pub fn effective_rule(&self) -> Option<RuleKind> {
        match self.validation.as_ref().and_then(|v| v.kind.clone()) {
            Some(RuleKind::Other(_)) | None => self.field_type.implied_rule(),
            Some(kind) => Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_normalize_from_mixed_shapes() {
        let json = r#"{
            "id": "f1", "name": "color", "label": "Color", "type": "single_select",
            "options": ["Red", {"value": "g", "label": "Green"}, {"value": "b"}]
        }"#;
        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.options[0], SelectOption::new("Red", "Red"));
        assert_eq!(field.options[1], SelectOption::new("g", "Green"));
        assert_eq!(field.options[2], SelectOption::new("b", "b"));
        assert!(field.scope.is_common());
    }

    #[test]
    fn test_unknown_operator_is_preserved() {
        let op: ConditionOperator = serde_json::from_str(r#""greater_than""#).unwrap();
        assert_eq!(op, ConditionOperator::Unknown("greater_than".into()));
        assert_eq!(serde_json::to_string(&ConditionOperator::NotEmpty).unwrap(), r#""not_empty""#);
    }

    #[test]
    fn test_effective_rule_override() {
        let field = FieldDefinition::new("contact", "Contact", FieldType::ShortText)
            .with_validation(ValidationRule { kind: Some(RuleKind::Email), ..Default::default() });
        assert_eq!(field.effective_rule(), Some(RuleKind::Email));

        let unknown = FieldDefinition::new("n", "N", FieldType::Number)
            .with_validation(ValidationRule { kind: Some(RuleKind::Other("iban".into())), ..Default::default() });
        assert_eq!(unknown.effective_rule(), Some(RuleKind::Number));
    }

    #[test]
    fn test_lookup_display_columns_exclude_label() {
        let binding = LookupBinding::new("suppliers", "id", "name")
            .with_display_columns(["name", "city", "vat", "city"]);
        assert_eq!(binding.extra_display_columns(), vec!["city", "vat"]);
        assert!(binding.filter().is_none());
    }
}
