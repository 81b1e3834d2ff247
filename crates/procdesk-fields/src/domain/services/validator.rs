//! Field validation
//!
//! `(answer, definition) -> ValidationResult`. At most one issue is reported
//! per field: required first, then the type rule, length bounds and finally
//! the custom pattern.

use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::domain::value_objects::{
    AnswerState, AnswerValue, EntityId, FieldDefinition, RuleKind, ValidationRule,
};

use super::ConditionEvaluator;

/// Why an answer was rejected
#[derive(Clone, Debug, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("This field is required")]
    Required,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("URL must start with http:// or https://")]
    InvalidUrl,

    #[error("Please enter a valid number")]
    NotANumber,

    #[error("Value must be at least {min}")]
    BelowMinimum { min: f64 },

    #[error("Value must be at most {max}")]
    AboveMaximum { max: f64 },

    #[error("Phone number may only contain digits, spaces and + - ( ) .")]
    InvalidPhone,

    #[error("Please enter a valid date (YYYY-MM-DD)")]
    InvalidDate,

    #[error("Please enter a valid date and time")]
    InvalidDateTime,

    #[error("Must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Must be at most {max} characters")]
    TooLong { max: usize },

    #[error("{message}")]
    PatternMismatch { message: String },
}

const DEFAULT_PATTERN_MESSAGE: &str = "Value does not match the required format";

/// Outcome of validating one field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: Option<String>,
    pub issue: Option<ValidationIssue>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { valid: true, message: None, issue: None }
    }

    pub fn invalid(issue: ValidationIssue) -> Self {
        Self { valid: false, message: Some(issue.to_string()), issue: Some(issue) }
    }
}

/// Aggregate result of validating every visible field
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormValidation {
    pub valid: bool,
    /// Field id to message, one entry per invalid field
    pub errors: BTreeMap<EntityId, String>,
    /// First invalid field in display order
    pub first_invalid: Option<EntityId>,
}

impl FormValidation {
    /// Aggregate per-field results given in display order
    pub fn collect<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = (&'a EntityId, &'a ValidationResult)>,
    {
        let mut errors = BTreeMap::new();
        let mut first_invalid = None;

        for (field_id, result) in results {
            if result.valid {
                continue;
            }
            if first_invalid.is_none() {
                first_invalid = Some(field_id.clone());
            }
            errors.insert(field_id.clone(), result.message.clone().unwrap_or_default());
        }

        Self { valid: errors.is_empty(), errors, first_invalid }
    }
}

/// Field validator with a compiled-pattern cache
#[derive(Debug, Default)]
pub struct FieldValidator {
    patterns: DashMap<String, Option<Regex>>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self, value: Option<&AnswerValue>, field: &FieldDefinition) -> ValidationResult {
        let empty = value.map(AnswerValue::is_empty).unwrap_or(true);
        if empty {
            return if field.required {
                ValidationResult::invalid(ValidationIssue::Required)
            } else {
                ValidationResult::ok()
            };
        }

        let Some(value) = value else {
            return ValidationResult::ok();
        };

        match self.check(value, field) {
            Some(issue) => ValidationResult::invalid(issue),
            None => ValidationResult::ok(),
        }
    }

    fn check(&self, value: &AnswerValue, field: &FieldDefinition) -> Option<ValidationIssue> {
        let rule = field.validation.as_ref();

        if let Some(kind) = field.effective_rule() {
            if let Some(issue) = check_type(&kind, value, rule) {
                return Some(issue);
            }
        }

        let text = match value {
            AnswerValue::Text(text) => text.as_str(),
            _ => return None,
        };
        let rule = rule?;

        if let Some(issue) = check_length(text, rule) {
            return Some(issue);
        }

        let pattern = rule.pattern.as_deref().filter(|p| !p.is_empty())?;
        match self.compiled(pattern) {
            Some(re) if !re.is_match(text) => Some(ValidationIssue::PatternMismatch {
                message: rule.message.clone().unwrap_or_else(|| DEFAULT_PATTERN_MESSAGE.to_string()),
            }),
            _ => None,
        }
    }

    fn compiled(&self, pattern: &str) -> Option<Regex> {
        if let Some(entry) = self.patterns.get(pattern) {
            return entry.value().clone();
        }
        let compiled = match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Ignoring invalid validation pattern {:?}: {}", pattern, e);
                None
            }
        };
        self.patterns.insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

fn check_type(kind: &RuleKind, value: &AnswerValue, rule: Option<&ValidationRule>) -> Option<ValidationIssue> {
    match kind {
        RuleKind::Number => check_number(value, rule),
        RuleKind::Email => {
            let text = value.as_str()?;
            (!email_regex().is_match(text.trim())).then_some(ValidationIssue::InvalidEmail)
        }
        RuleKind::Url => {
            let text = value.as_str()?.trim();
            (!(text.starts_with("http://") || text.starts_with("https://")))
                .then_some(ValidationIssue::InvalidUrl)
        }
        RuleKind::Phone => {
            let text = value.as_str()?;
            let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.');
            (!text.chars().all(allowed)).then_some(ValidationIssue::InvalidPhone)
        }
        RuleKind::Date => {
            let text = value.as_str()?.trim();
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .is_err()
                .then_some(ValidationIssue::InvalidDate)
        }
        RuleKind::DateTime => {
            let text = value.as_str()?.trim();
            (!is_datetime(text)).then_some(ValidationIssue::InvalidDateTime)
        }
        RuleKind::Other(_) => None,
    }
}

fn check_number(value: &AnswerValue, rule: Option<&ValidationRule>) -> Option<ValidationIssue> {
    let number = match value {
        AnswerValue::Number(n) => *n,
        AnswerValue::Text(text) => match text.trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) => return Some(ValidationIssue::NotANumber),
        },
        _ => return Some(ValidationIssue::NotANumber),
    };

    if !number.is_finite() {
        return Some(ValidationIssue::NotANumber);
    }

    let rule = rule?;
    if let Some(min) = rule.min_value {
        if number < min {
            return Some(ValidationIssue::BelowMinimum { min });
        }
    }
    if let Some(max) = rule.max_value {
        if number > max {
            return Some(ValidationIssue::AboveMaximum { max });
        }
    }
    None
}

fn check_length(text: &str, rule: &ValidationRule) -> Option<ValidationIssue> {
    let len = text.chars().count();
    if let Some(min) = rule.min_length {
        if len < min {
            return Some(ValidationIssue::TooShort { min });
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Some(ValidationIssue::TooLong { max });
        }
    }
    None
}

fn is_datetime(text: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(text).is_ok()
        || chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M").is_ok()
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to build email pattern")
    })
}

/// Validate every visible field; hidden fields are skipped entirely
pub fn validate_all(
    fields: &[FieldDefinition],
    answers: &AnswerState,
    evaluator: &ConditionEvaluator,
    validator: &FieldValidator,
) -> FormValidation {
    let results: Vec<(&EntityId, ValidationResult)> = fields
        .iter()
        .filter(|field| evaluator.is_visible(field, answers))
        .map(|field| (&field.id, validator.validate(answers.get(field.id.as_str()), field)))
        .collect();

    FormValidation::collect(results.iter().map(|(id, result)| (*id, result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ConditionOperator, FieldType};

    fn check(field: &FieldDefinition, value: &str) -> ValidationResult {
        FieldValidator::new().validate(Some(&AnswerValue::text(value)), field)
    }

    #[test]
    fn test_required() {
        let field = FieldDefinition::new("name", "Name", FieldType::ShortText).required();
        let validator = FieldValidator::new();
        for value in [None, Some(AnswerValue::Null), Some(AnswerValue::text(""))] {
            let result = validator.validate(value.as_ref(), &field);
            assert!(!result.valid);
            assert_eq!(result.issue, Some(ValidationIssue::Required));
            assert_eq!(result.message.as_deref(), Some("This field is required"));
        }
        assert!(check(&field, "Ada").valid);
    }

    #[test]
    fn test_required_accepts_whitespace_and_unchecked_box() {
        let text = FieldDefinition::new("name", "Name", FieldType::ShortText).required();
        assert!(check(&text, "  ").valid);

        let agree = FieldDefinition::new("agree", "Agree", FieldType::Checkbox).required();
        assert!(FieldValidator::new().validate(Some(&AnswerValue::Bool(false)), &agree).valid);
    }

    #[test]
    fn test_optional_empty_skips_type_rules() {
        let field = FieldDefinition::new("mail", "Mail", FieldType::Email)
            .with_validation(ValidationRule::pattern("^x$"));
        assert!(check(&field, "").valid);
        assert!(FieldValidator::new().validate(None, &field).valid);
    }

    #[test]
    fn test_email() {
        let field = FieldDefinition::new("mail", "Mail", FieldType::Email);
        let result = check(&field, "a@b");
        assert!(!result.valid);
        assert_eq!(result.issue, Some(ValidationIssue::InvalidEmail));
        assert!(result.message.unwrap().contains("email"));
        assert!(check(&field, "a@b.com").valid);
    }

    #[test]
    fn test_url() {
        let field = FieldDefinition::new("site", "Site", FieldType::Url);
        assert_eq!(check(&field, "ftp://x.org").issue, Some(ValidationIssue::InvalidUrl));
        assert!(check(&field, "https://x.org").valid);
        assert!(check(&field, "http://x.org").valid);
    }

    #[test]
    fn test_number_range() {
        let field = FieldDefinition::new("qty", "Qty", FieldType::Number)
            .with_validation(ValidationRule::range(Some(1.0), Some(10.0)));
        let high = check(&field, "15");
        assert_eq!(high.issue, Some(ValidationIssue::AboveMaximum { max: 10.0 }));
        assert_eq!(high.message.as_deref(), Some("Value must be at most 10"));
        let low = check(&field, "0");
        assert_eq!(low.message.as_deref(), Some("Value must be at least 1"));
        assert!(check(&field, "5").valid);
        assert!(check(&field, "10").valid);
        assert!(check(&field, "1").valid);
        assert_eq!(check(&field, "abc").issue, Some(ValidationIssue::NotANumber));
        assert_eq!(check(&field, "inf").issue, Some(ValidationIssue::NotANumber));

        let numeric = FieldValidator::new().validate(Some(&AnswerValue::Number(11.0)), &field);
        assert!(!numeric.valid);
    }

    #[test]
    fn test_phone() {
        let field = FieldDefinition::new("tel", "Tel", FieldType::Phone);
        assert!(check(&field, "+33 (0)1 23.45-67").valid);
        assert_eq!(check(&field, "call me").issue, Some(ValidationIssue::InvalidPhone));
    }

    #[test]
    fn test_dates() {
        let date = FieldDefinition::new("d", "D", FieldType::Date);
        assert!(check(&date, "2024-02-29").valid);
        assert_eq!(check(&date, "2023-02-29").issue, Some(ValidationIssue::InvalidDate));

        let datetime = FieldDefinition::new("dt", "DT", FieldType::DateTime);
        assert!(check(&datetime, "2024-05-01T09:30").valid);
        assert!(check(&datetime, "2024-05-01T09:30:00+02:00").valid);
        assert!(!check(&datetime, "tomorrow").valid);
    }

    #[test]
    fn test_custom_pattern_and_message() {
        let field = FieldDefinition::new("code", "Code", FieldType::ShortText).with_validation(ValidationRule {
            pattern: Some("^[A-Z]{3}-\\d+$".into()),
            message: Some("Use the ABC-123 format".into()),
            ..Default::default()
        });
        assert!(check(&field, "ABC-42").valid);
        let result = check(&field, "abc");
        assert_eq!(result.message.as_deref(), Some("Use the ABC-123 format"));
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let field = FieldDefinition::new("code", "Code", FieldType::ShortText)
            .with_validation(ValidationRule::pattern("([unclosed"));
        let validator = FieldValidator::new();
        assert!(validator.validate(Some(&AnswerValue::text("anything")), &field).valid);
        assert!(validator.validate(Some(&AnswerValue::text("again")), &field).valid);
    }

    #[test]
    fn test_length_bounds() {
        let field = FieldDefinition::new("bio", "Bio", FieldType::LongText).with_validation(ValidationRule {
            min_length: Some(3),
            max_length: Some(5),
            ..Default::default()
        });
        assert_eq!(check(&field, "ab").issue, Some(ValidationIssue::TooShort { min: 3 }));
        assert_eq!(check(&field, "abcdef").issue, Some(ValidationIssue::TooLong { max: 5 }));
        assert!(check(&field, "éèà").valid);
    }

    #[test]
    fn test_rule_kind_override() {
        let field = FieldDefinition::new("c", "C", FieldType::ShortText)
            .with_validation(ValidationRule { kind: Some(RuleKind::Email), ..Default::default() });
        assert_eq!(check(&field, "nope").issue, Some(ValidationIssue::InvalidEmail));
    }

    #[test]
    fn test_required_table_needs_rows() {
        let field = FieldDefinition::new("items", "Items", FieldType::RepeatableTable).required();
        let validator = FieldValidator::new();
        assert!(!validator.validate(Some(&AnswerValue::Rows(vec![])), &field).valid);
        let rows = AnswerValue::Rows(vec![crate::domain::value_objects::TableRow::new()]);
        assert!(validator.validate(Some(&rows), &field).valid);
    }

    #[test]
    fn test_validate_all_skips_hidden_fields() {
        let fields = vec![
            FieldDefinition::new("a", "A", FieldType::SingleSelect).with_options(["X", "Y"]),
            FieldDefinition::new("b", "B", FieldType::ShortText)
                .required()
                .visible_when("a", ConditionOperator::Equals, Some("X")),
            FieldDefinition::new("c", "C", FieldType::Email),
        ];
        let evaluator = ConditionEvaluator::for_fields(&fields);
        let validator = FieldValidator::new();

        let mut answers = AnswerState::new();
        answers.set("a", "Y".into());
        answers.set("c", "bad".into());
        let outcome = validate_all(&fields, &answers, &evaluator, &validator);
        assert!(!outcome.valid);
        assert!(!outcome.errors.contains_key("b"));
        assert_eq!(outcome.first_invalid.as_ref().map(|id| id.as_str()), Some("c"));

        answers.set("a", "X".into());
        let outcome = validate_all(&fields, &answers, &evaluator, &validator);
        assert_eq!(outcome.first_invalid.as_ref().map(|id| id.as_str()), Some("b"));
        assert_eq!(outcome.errors.len(), 2);
    }

    proptest::proptest! {
        #[test]
        fn prop_optional_empty_is_valid(ty in 0usize..6, null in proptest::bool::ANY) {
            let field_type = [FieldType::ShortText, FieldType::Email, FieldType::Number,
                FieldType::Url, FieldType::Phone, FieldType::Date][ty];
            let field = FieldDefinition::new("f", "F", field_type)
                .with_validation(ValidationRule { min_length: Some(2), pattern: Some("^z$".into()), ..Default::default() });
            let validator = FieldValidator::new();
            let empty = if null { AnswerValue::Null } else { AnswerValue::text("") };
            proptest::prop_assert!(validator.validate(Some(&empty), &field).valid);
            proptest::prop_assert!(validator.validate(None, &field).valid);
        }

        #[test]
        fn prop_required_empty_is_required_issue(ty in 0usize..6) {
            let field_type = [FieldType::ShortText, FieldType::Email, FieldType::Number,
                FieldType::Url, FieldType::Phone, FieldType::Date][ty];
            let field = FieldDefinition::new("f", "F", field_type).required();
            let validator = FieldValidator::new();
            for value in [None, Some(AnswerValue::Null), Some(AnswerValue::text(""))] {
                let result = validator.validate(value.as_ref(), &field);
                proptest::prop_assert!(!result.valid);
                proptest::prop_assert_eq!(result.issue, Some(ValidationIssue::Required));
            }
        }
    }
}
