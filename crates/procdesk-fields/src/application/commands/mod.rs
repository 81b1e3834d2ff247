//! Form assembly service
//!
//! Fetches definitions per scope, resolves and organizes them, and opens
//! sessions with a fresh lookup cache each.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::dto::{AssembledForm, OrganizedForm, RequestContext};
use crate::cache::LookupCache;
use crate::config::EngineConfig;
use crate::domain::aggregates::FormSession;
use crate::domain::services::{ScopeResolver, SectionOrganizer, SubProcessFields};
use crate::domain::value_objects::{AnswerState, FieldDefinition, FieldScope, Section};
use crate::ports::inbound::{FormAssemblyUseCases, UseCaseError};
use crate::ports::outbound::{FieldDefinitionSource, LookupSource};

pub struct FormAssemblyService {
    definitions: Arc<dyn FieldDefinitionSource>,
    lookups: Arc<dyn LookupSource>,
    organizer: SectionOrganizer,
    config: EngineConfig,
}

impl FormAssemblyService {
    pub fn new(
        definitions: Arc<dyn FieldDefinitionSource>,
        lookups: Arc<dyn LookupSource>,
        config: EngineConfig,
    ) -> Self {
        Self { definitions, lookups, organizer: SectionOrganizer::from_config(&config), config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Session-scoped cache over this service's lookup source
    pub fn lookup_cache(&self) -> LookupCache {
        LookupCache::new(self.lookups.clone(), &self.config)
    }

    async fn fields_for(&self, scope: &FieldScope) -> Vec<FieldDefinition> {
        match self.definitions.list_fields_by_scope(scope).await {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!("Listing {} fields failed, continuing without them: {}", scope, e);
                vec![]
            }
        }
    }

    async fn sections_for(&self, context: &RequestContext) -> Vec<Section> {
        let filter = context.section_filter();
        match self.definitions.list_sections(&filter).await {
            Ok(sections) => sections.into_iter().filter(|s| filter.matches(s)).collect(),
            Err(e) => {
                tracing::warn!("Listing sections failed, continuing without them: {}", e);
                vec![]
            }
        }
    }
}

fn check_context(context: &RequestContext) -> Result<(), UseCaseError> {
    if context.process_id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
        return Err(UseCaseError::InvalidContext("process id is empty".into()));
    }

    let mut seen = HashSet::new();
    for sub in &context.sub_processes {
        if sub.id.as_str().trim().is_empty() {
            return Err(UseCaseError::InvalidContext("sub-process id is empty".into()));
        }
        if !seen.insert(&sub.id) {
            return Err(UseCaseError::InvalidContext(format!("sub-process {} selected twice", sub.id)));
        }
    }
    Ok(())
}

#[async_trait]
impl FormAssemblyUseCases for FormAssemblyService {
    async fn assemble(&self, context: &RequestContext) -> Result<AssembledForm, UseCaseError> {
        check_context(context)?;

        let common = self.fields_for(&FieldScope::Common).await;
        let process = match &context.process_id {
            Some(id) => self.fields_for(&FieldScope::Process(id.clone())).await,
            None => vec![],
        };

        let mut sub_processes = Vec::with_capacity(context.sub_processes.len());
        for sub in &context.sub_processes {
            sub_processes.push(SubProcessFields {
                sub_process_id: sub.id.clone(),
                name: sub.name.clone(),
                fields: self.fields_for(&FieldScope::SubProcess(sub.id.clone())).await,
            });
        }

        let resolved = ScopeResolver::resolve(&common, &process, &sub_processes, &context.active_sub_process_ids());
        let all: Vec<FieldDefinition> = resolved.all().cloned().collect();
        let sections = self.sections_for(context).await;
        let organized = OrganizedForm { sections: self.organizer.organize(&all, &sections) };

        tracing::info!(
            "Assembled {} fields in {} sections for process {:?}",
            all.len(),
            organized.sections.len(),
            context.process_id.as_ref().map(|id| id.as_str())
        );

        Ok(AssembledForm { context: context.clone(), resolved, organized })
    }

    async fn open_session(&self, context: &RequestContext, answers: AnswerState) -> Result<FormSession, UseCaseError> {
        let form = self.assemble(context).await?;
        let mut session = FormSession::open(form.fields(), answers, &self.config);

        let cache = self.lookup_cache();
        session.load_lookups(&cache).await;
        Ok(session)
    }
}
