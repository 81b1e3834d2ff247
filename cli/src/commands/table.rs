//! Table command

use procdesk_fields::domain::aggregates::ColumnKind;
use procdesk_fields::EngineConfig;
use std::path::Path;
use tabled::Tabled;

use super::{Outcome, Workspace};
use crate::{output::OutputFormat, AnswersArgs, ContextArgs};

/// Lookup label to pick in a new row
pub struct Pick {
    pub field: String,
    pub column: String,
    pub label: String,
}

#[derive(Tabled)]
struct CellRow {
    #[tabled(rename = "Column")]
    key: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(
    context: &ContextArgs,
    answers: &AnswersArgs,
    pick: &Pick,
    bundle: Option<&Path>,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<Outcome, String> {
    let workspace = Workspace::load(bundle, engine)?;
    let mut session = workspace.open_session(context, answers).await?;

    let row_id = session.add_row(&pick.field).map_err(|e| e.to_string())?;
    session
        .select_lookup(&pick.field, &row_id, &pick.column, &pick.label)
        .map_err(|e| e.to_string())?;

    let table = session.table(&pick.field).ok_or_else(|| format!("Field {} is not a table", pick.field))?;
    let row = table.row(&row_id).cloned().ok_or_else(|| format!("Row {} vanished", row_id))?;

    let cells: Vec<CellRow> = table
        .effective_columns()
        .into_iter()
        .map(|column| CellRow {
            value: row.get(&column.key).to_string(),
            kind: match column.kind {
                ColumnKind::Editable => "editable",
                ColumnKind::Searchable => "lookup",
                ColumnKind::ReadOnly => "read-only",
            }
            .to_string(),
            key: column.key,
            label: column.label,
        })
        .collect();

    format.print(&row, cells);
    Ok(Outcome::Success)
}
