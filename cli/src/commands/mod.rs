//! CLI Commands

pub mod config;
pub mod resolve;
pub mod table;
pub mod validate;
pub mod visibility;

use procdesk_fields::{AnswerState, EngineConfig, FormAssemblyService, FormAssemblyUseCases, FormBundle, FormSession};
use std::path::Path;
use std::sync::Arc;

use crate::{AnswersArgs, ContextArgs};

/// How a command finished, mapped to the process exit status
pub enum Outcome {
    Success,
    ValidationFailed,
}

/// Bundle-backed assembly service
pub struct Workspace {
    pub bundle: Arc<FormBundle>,
    pub service: FormAssemblyService,
}

impl Workspace {
    pub fn load(bundle: Option<&Path>, engine: &EngineConfig) -> Result<Self, String> {
        let path = bundle.ok_or("No form bundle given; pass --bundle or set PROCDESK_BUNDLE")?;
        let bundle = Arc::new(FormBundle::load(path).map_err(|e| format!("{}: {}", path.display(), e))?);
        let service = FormAssemblyService::new(bundle.clone(), bundle.clone(), engine.clone());
        Ok(Self { bundle, service })
    }

    pub async fn open_session(&self, context: &ContextArgs, answers: &AnswersArgs) -> Result<FormSession, String> {
        let answers = load_answers(answers.answers.as_deref())?;
        let context = self.bundle.context(context.process.as_deref(), &context.sub_processes);
        self.service.open_session(&context, answers).await.map_err(|e| e.to_string())
    }
}

/// Read prior answers; `.yaml`/`.yml` files are YAML, anything else JSON
pub fn load_answers(path: Option<&Path>) -> Result<AnswerState, String> {
    let Some(path) = path else {
        return Ok(AnswerState::new());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    parse_answers(&text, path.extension().and_then(|e| e.to_str()))
}

fn parse_answers(text: &str, extension: Option<&str>) -> Result<AnswerState, String> {
    match extension {
        Some("yaml") | Some("yml") => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        _ => serde_json::from_str(text).map_err(|e| e.to_string()),
    }
}

/// Yes/no cell
pub fn flag(value: bool) -> String {
    use colored::Colorize;
    if value {
        "yes".green().to_string()
    } else {
        "no".dimmed().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procdesk_fields::AnswerValue;

    #[test]
    fn test_answers_parse_from_json_and_yaml() {
        let json = parse_answers(r#"{"qty": 3, "name": "Ada"}"#, Some("json")).unwrap();
        assert_eq!(json.get("qty"), Some(&AnswerValue::Number(3.0)));

        let yaml = parse_answers("name: Ada\nurgent: true\n", Some("yml")).unwrap();
        assert_eq!(yaml.get("urgent"), Some(&AnswerValue::Bool(true)));
        assert_eq!(yaml.get("name"), Some(&AnswerValue::text("Ada")));
    }

    #[test]
    fn test_missing_answers_file_is_empty() {
        assert!(load_answers(None).unwrap().is_empty());
        assert!(load_answers(Some(Path::new("/nonexistent/answers.json"))).is_err());
    }
}
