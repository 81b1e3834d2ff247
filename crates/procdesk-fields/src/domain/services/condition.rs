//! Conditional visibility
//!
//! Pure evaluation of a field's visibility condition against the current
//! answers. Misconfigured conditions fail open.

use std::collections::HashSet;

use crate::domain::value_objects::{
    AnswerState, AnswerValue, ConditionOperator, EntityId, FieldDefinition, VisibilityCondition,
};

/// Visibility evaluator bound to the set of fields present in a form
#[derive(Clone, Debug, Default)]
pub struct ConditionEvaluator {
    known: HashSet<EntityId>,
}

impl ConditionEvaluator {
    pub fn for_fields<'a>(fields: impl IntoIterator<Item = &'a FieldDefinition>) -> Self {
        Self { known: fields.into_iter().map(|f| f.id.clone()).collect() }
    }

    pub fn is_visible(&self, field: &FieldDefinition, answers: &AnswerState) -> bool {
        let Some(condition) = &field.condition else {
            return true;
        };

        if !self.known.contains(&condition.field_id) {
            tracing::debug!(
                "Condition on {} references unknown field {}; treating as visible",
                field.id,
                condition.field_id
            );
            return true;
        }

        evaluate(condition, answers.get(condition.field_id.as_str()))
    }

    /// Fields whose condition reads `field_id`
    pub fn dependents<'a>(
        &self,
        field_id: &'a str,
        fields: &'a [FieldDefinition],
    ) -> impl Iterator<Item = &'a FieldDefinition> + 'a {
        fields.iter().filter(move |f| {
            f.condition.as_ref().map(|c| c.field_id.as_str() == field_id).unwrap_or(false)
        })
    }
}

/// Evaluate one condition against the referenced answer
pub fn evaluate(condition: &VisibilityCondition, answer: Option<&AnswerValue>) -> bool {
    let expected = condition.value.as_deref().unwrap_or("");

    match &condition.operator {
        ConditionOperator::Equals => answer_equals(answer, expected),
        ConditionOperator::NotEquals => !answer_equals(answer, expected),
        ConditionOperator::Contains => match answer.and_then(AnswerValue::as_str) {
            Some(text) => text.to_lowercase().contains(&expected.to_lowercase()),
            None => false,
        },
        ConditionOperator::NotEmpty => answer.map(|a| !a.is_empty()).unwrap_or(false),
        ConditionOperator::Unknown(raw) => {
            tracing::debug!("Unknown condition operator {:?}; treating as visible", raw);
            true
        }
    }
}

fn answer_equals(answer: Option<&AnswerValue>, expected: &str) -> bool {
    answer.and_then(AnswerValue::as_text).map(|text| text == expected).unwrap_or(false)
}
