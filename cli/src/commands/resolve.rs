//! Resolve command

use procdesk_fields::{EngineConfig, FormAssemblyUseCases};
use std::path::Path;
use tabled::Tabled;

use super::{flag, Outcome, Workspace};
use crate::{output::OutputFormat, ContextArgs};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Field")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Type")]
    field_type: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Required")]
    required: String,
}

pub async fn handle(
    context: &ContextArgs,
    bundle: Option<&Path>,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<Outcome, String> {
    let workspace = Workspace::load(bundle, engine)?;
    let request = workspace.bundle.context(context.process.as_deref(), &context.sub_processes);
    let form = workspace.service.assemble(&request).await.map_err(|e| e.to_string())?;

    let rows: Vec<FieldRow> = form
        .organized
        .sections
        .iter()
        .flat_map(|section| {
            section.fields.iter().map(move |field| FieldRow {
                section: section.label.clone(),
                id: field.id.to_string(),
                label: field.label.clone(),
                field_type: field.field_type.to_string(),
                scope: field.scope.to_string(),
                required: flag(field.required),
            })
        })
        .collect();

    format.print(&form.organized, rows);
    Ok(Outcome::Success)
}
