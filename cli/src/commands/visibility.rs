//! Visibility command

use procdesk_fields::EngineConfig;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use super::{flag, Outcome, Workspace};
use crate::{output::OutputFormat, AnswersArgs, ContextArgs};

#[derive(Serialize)]
struct FieldVisibility {
    field_id: String,
    visible: bool,
    condition: Option<String>,
}

#[derive(Tabled)]
struct VisibilityRow {
    #[tabled(rename = "Field")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Visible")]
    visible: String,
    #[tabled(rename = "Condition")]
    condition: String,
}

pub async fn handle(
    context: &ContextArgs,
    answers: &AnswersArgs,
    bundle: Option<&Path>,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<Outcome, String> {
    let workspace = Workspace::load(bundle, engine)?;
    let session = workspace.open_session(context, answers).await?;

    let mut report = Vec::new();
    let mut rows = Vec::new();
    for field in session.fields() {
        let visible = session.is_visible(field.id.as_str());
        let condition = field.condition.as_ref().map(|c| {
            format!("{} {} {}", c.field_id, c.operator, c.value.as_deref().unwrap_or_default())
                .trim_end()
                .to_string()
        });

        rows.push(VisibilityRow {
            id: field.id.to_string(),
            label: field.label.clone(),
            visible: flag(visible),
            condition: condition.clone().unwrap_or_default(),
        });
        report.push(FieldVisibility { field_id: field.id.to_string(), visible, condition });
    }

    format.print(&report, rows);
    Ok(Outcome::Success)
}
