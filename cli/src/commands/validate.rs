//! Validate command

use colored::Colorize;
use procdesk_fields::EngineConfig;
use std::path::Path;
use tabled::Tabled;

use super::{Outcome, Workspace};
use crate::{output::OutputFormat, AnswersArgs, ContextArgs};

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Field")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub async fn handle(
    context: &ContextArgs,
    answers: &AnswersArgs,
    bundle: Option<&Path>,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<Outcome, String> {
    let workspace = Workspace::load(bundle, engine)?;
    let mut session = workspace.open_session(context, answers).await?;
    let outcome = session.validate_all();

    let rows: Vec<ResultRow> = session
        .visible_fields()
        .map(|field| {
            let message = session.message(field.id.as_str());
            ResultRow {
                id: field.id.to_string(),
                label: field.label.clone(),
                status: match message {
                    Some(_) => "invalid".red().to_string(),
                    None => "ok".green().to_string(),
                },
                message: message.unwrap_or_default().to_string(),
            }
        })
        .collect();

    format.print(&outcome, rows);

    if outcome.valid {
        Ok(Outcome::Success)
    } else {
        Ok(Outcome::ValidationFailed)
    }
}
